//! Lexical analysis for command lines typed into the build shell.
//!
//! The command language has no quoting or escaping: a line is a sequence of
//! words separated by runs of whitespace, and nothing else. A word that contains
//! a space cannot be written. Keep it that way; adding quote handling here would
//! change how existing aliases and property flags are split.

/// Splits a raw input line into its whitespace-separated tokens.
///
/// Leading, trailing and repeated whitespace never produce empty tokens, so an
/// empty or blank line yields an empty vector, which callers treat as a no-op.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Returns the byte offset where the last whitespace-delimited token of `line`
/// starts. A line ending in whitespace has an empty trailing token at `line.len()`.
pub fn trailing_token_start(line: &str) -> usize {
    line.rfind(char::is_whitespace)
        .map(|i| i + line[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0)
}
