// ABOUTME: Domain service layer for multi-step operations
// ABOUTME: Conversation-turn orchestration and conversation naming
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Domain services sitting between the route handlers and the database /
//! provider layers.

pub mod chat_orchestration;
pub mod naming;
