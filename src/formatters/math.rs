// ABOUTME: Math-notation formatter converting plain-text math into LaTeX delimiters
// ABOUTME: Placeholder-protects existing math spans so they are never double-wrapped
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Math-Notation Formatter
//!
//! Converts plain-text mathematical expressions in a provider answer into
//! dollar-delimited LaTeX. The transform is a fixed, ordered list of
//! (pattern, replacement) rules applied sequentially over a working string.
//! Spans that are already delimited (`$$...$$` blocks and `$...$` inline)
//! are lifted out into placeholders before the rules run and restored
//! afterwards, so correctly-marked math is never wrapped twice.
//!
//! The function is pure and total: any input produces best-effort output.

use regex::Regex;
use std::sync::LazyLock;

/// Sentinel delimiters for protected fragments. Private-use code points
/// cannot appear in provider output, so placeholders never collide with
/// surrounding text.
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Block-delimited math: `$$ ... $$`
static BLOCK_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$[^$]*\$\$").expect("valid regex"));

/// Inline-delimited math: `$ ... $` on a single line
static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[^$\n]*\$").expect("valid regex"));

/// Whitespace-only block delimiter pair left behind by the rewrites
static EMPTY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$\s*\$\$").expect("valid regex"));

/// Whitespace-only inline pair; requires at least one space so adjacent
/// legitimate delimiters survive
static EMPTY_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s+\$").expect("valid regex"));

/// Runs of spaces/tabs produced by removals
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

/// The ordered rewrite rules applied to unprotected text
static REWRITE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // Single-letter function calls: f(x)
        (r"\b([a-zA-Z])\(([a-zA-Z])\)", "$$${1}(${2})$$"),
        // Derivative notations, before the generic fraction rule
        (r"\bdy/dx\b", r"$$\frac{dy}{dx}$$"),
        (r"\bd/dx\b", r"$$\frac{d}{dx}$$"),
        // Parenthesized exponents: (x+1)^2
        (r"\(([^)]+)\)\^([0-9]+)", "$$(${1})^{${2}}$$"),
        // Simple exponents: x^2
        (r"\b([a-zA-Z]+)\^([0-9]+)", "$$${1}^{${2}}$$"),
        // Square roots
        (r"sqrt\(([^)]+)\)", r"$$\sqrt{${1}}$$"),
        // Fraction-like expressions: a/b
        (
            r"\b([a-zA-Z0-9']+)\s*/\s*([a-zA-Z0-9']+)\b",
            r"$$\frac{${1}}{${2}}$$",
        ),
        // Greek letter names
        (
            r"\b(pi|alpha|beta|gamma|delta|theta|lambda|mu|sigma)\b",
            r"$$\${1}$$",
        ),
        // Trigonometric functions, applied and spaced forms
        (r"\b(sin|cos|tan|sec|csc|cot)\(([^)]*)\)", r"$$\${1}(${2})$$"),
        (r"\b(sin|cos|tan|sec|csc|cot)\s+([a-zA-Z]+)\b", r"$$\${1} ${2}$$"),
        // Logarithms
        (r"\b(ln|log)\(([^)]*)\)", r"$$\${1}(${2})$$"),
        // Limits, integrals, infinity
        (r"\blim\b", r"$$\lim$$"),
        (r"(?i)\bintegral\s+of\b", r"$$\int$$"),
        (r"∫", r"$$\int$$"),
        (r"(?i)\binfinity\b", r"$$\infty$$"),
        (r"∞", r"$$\infty$$"),
        // Prime notation: f' (not inside words like "it's")
        (r"([a-zA-Z])'([^0-9A-Za-z_]|$)", "$$${1}'$$${2}"),
        // Bare subscript-like pairs: x1, x2
        (r"\b([a-zA-Z])([0-9]+)\b", "$$${1}_{${2}}$$"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

/// Format plain-text math in `raw` into dollar-delimited LaTeX
///
/// Pre-delimited spans pass through untouched, so running the formatter
/// over its own output does not re-wrap anything.
#[must_use]
pub fn format_math(raw: &str) -> String {
    let (mut working, protected) = protect_existing_math(raw);

    for (pattern, replacement) in REWRITE_RULES.iter() {
        working = pattern.replace_all(&working, *replacement).into_owned();
    }

    working = restore_protected(&working, &protected);

    working = EMPTY_BLOCK.replace_all(&working, "").into_owned();
    working = EMPTY_INLINE.replace_all(&working, "").into_owned();
    working = SPACE_RUNS.replace_all(&working, " ").into_owned();

    working.trim().to_owned()
}

/// Lift already-delimited math spans out of the text
///
/// Returns the working text with each span replaced by a placeholder token
/// and the ordered list of original fragments.
fn protect_existing_math(raw: &str) -> (String, Vec<String>) {
    let mut protected = Vec::new();

    let after_blocks = BLOCK_MATH
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            let token = placeholder(protected.len());
            protected.push(caps[0].to_owned());
            token
        })
        .into_owned();

    let after_inline = INLINE_MATH
        .replace_all(&after_blocks, |caps: &regex::Captures<'_>| {
            let token = placeholder(protected.len());
            protected.push(caps[0].to_owned());
            token
        })
        .into_owned();

    (after_inline, protected)
}

/// Replace each placeholder token with its original fragment
fn restore_protected(working: &str, protected: &[String]) -> String {
    let mut result = working.to_owned();
    for (index, fragment) in protected.iter().enumerate() {
        result = result.replace(&placeholder(index), fragment);
    }
    result
}

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}")
}
