// ABOUTME: System prompts for the AI tutor persona
// ABOUTME: Defines behavioral rules sent as the system message of every turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Tutor persona prompts.
//!
//! The system prompt carries the tutoring persona, the domain focus, and
//! the continuity rules that keep multi-turn conversations coherent. The
//! plain-text variant is selected when the client asked for answers without
//! display markup.

/// Build the tutor system prompt for one conversation turn
///
/// `plain_text` disables math display markup in the answer, for clients
/// that render plain text only.
#[must_use]
pub fn tutor_system_prompt(plain_text: bool) -> String {
    let mut prompt = String::from(
        "You are an expert mathematics tutor. Answer clearly and precisely, \
         with special attention to derivatives and calculus. Keep answers \
         focused on the student's question and at the student's level.\n\
         You are in an ongoing conversation: maintain continuity with the \
         prior exchanges, refer back to them when useful, and never claim \
         you cannot remember earlier messages of this conversation.",
    );

    if plain_text {
        prompt.push_str(
            "\nWrite all mathematics in plain text. Do not use LaTeX or any \
             display markup such as $...$ delimiters.",
        );
    } else {
        prompt.push_str(
            "\nWrite mathematical expressions in LaTeX, using $...$ for \
             inline math and $$...$$ for display math.",
        );
    }

    prompt
}
