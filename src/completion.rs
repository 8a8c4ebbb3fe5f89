//! Tab completion of command words.

use crate::lexer::trailing_token_start;
use rustyline::Context;
use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

/// Prefix completion over a fixed vocabulary of command words.
#[derive(Debug, Clone, Default)]
pub struct CommandCompleter {
    vocabulary: Vec<String>,
}

impl CommandCompleter {
    /// Creates a completer; the vocabulary is sorted case-insensitively once, here.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary: Vec<String> = words.into_iter().map(Into::into).collect();
        vocabulary.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        vocabulary.dedup();
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Returns where the replacement starts and the matching words.
    ///
    /// Words extending the whole buffer are anchored at 0; words extending the
    /// last token are anchored at that token's start, and that anchor wins when
    /// both passes match. A word matching both passes is listed twice.
    pub fn complete(&self, buffer: &str, cursor: usize) -> (usize, Vec<String>) {
        let mut cursor = cursor.min(buffer.len());
        while !buffer.is_char_boundary(cursor) {
            cursor -= 1;
        }
        let line = &buffer[..cursor];
        let token_start = trailing_token_start(line);
        let token = &line[token_start..];

        let mut start = token_start;
        let mut candidates = Vec::new();

        let whole = self.matching(line);
        if !whole.is_empty() {
            start = 0;
            candidates.extend(whole);
        }

        let trailing = self.matching(token);
        if !trailing.is_empty() {
            start = token_start;
            candidates.extend(trailing);
        }

        (start, candidates)
    }

    fn matching(&self, prefix: &str) -> Vec<String> {
        self.vocabulary
            .iter()
            .filter(|word| word.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Line editor glue exposing [`CommandCompleter`] to `rustyline`.
pub struct CommandHelper {
    completer: CommandCompleter,
}

impl CommandHelper {
    pub fn new(completer: CommandCompleter) -> Self {
        Self { completer }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(self.completer.complete(line, pos))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

impl rustyline::Helper for CommandHelper {}
