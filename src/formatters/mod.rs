// ABOUTME: Output formatting for provider answers
// ABOUTME: Currently math-notation normalization into LaTeX delimiters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Output formatting for answers returned by the LLM provider.

mod math;

pub use math::format_math;
