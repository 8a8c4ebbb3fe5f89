//! Alias tables and the two ways of expanding them.
//!
//! The grouped flow splices alias replacements into the token stream
//! ([`AliasTable::expand_tokens`]); the goal flow resolves a whole line down to
//! qualified goal references ([`AliasTable::resolve_goal_calls`]). Both keep an
//! arena of the expansions performed so far, where each entry points at the
//! expansion that produced it. An alias found among its own ancestors is a cycle.

use crate::error::{Result, ShellError};
use crate::goal::GoalCall;
use crate::lexer::split_into_tokens;
use std::collections::HashMap;

/// Hard cap on expansions per resolution call. Cycles are caught by the
/// ancestry check long before this; it bounds pathological fan-out.
pub const EXPANSION_LIMIT: usize = 4096;

/// Goal aliases every goal-mode session starts with.
pub const BUILTIN_GOALS: &[(&str, &str)] = &[
    ("compile", "org.apache.maven.plugins:maven-compiler-plugin:compile"),
    (
        "testCompile",
        "org.apache.maven.plugins:maven-compiler-plugin:testCompile",
    ),
    ("jar", "org.apache.maven.plugins:maven-jar-plugin:jar"),
    ("war", "org.apache.maven.plugins:maven-war-plugin:war"),
    (
        "resources",
        "org.apache.maven.plugins:maven-resources-plugin:resources",
    ),
    ("install", "org.apache.maven.plugins:maven-install-plugin:install"),
    ("deploy", "org.apache.maven.plugins:maven-deploy-plugin:deploy"),
    ("test", "org.apache.maven.plugins:maven-surefire-plugin:test"),
    ("clean", "org.apache.maven.plugins:maven-clean-plugin:clean"),
];

/// Immutable mapping from alias name to its replacement line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

struct Expansion {
    alias: String,
    parent: Option<usize>,
}

impl AliasTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Builds a table from built-in entries, letting `overrides` replace any
    /// built-in with the same name.
    pub fn with_overrides<'a>(
        builtins: impl IntoIterator<Item = (&'a str, &'a str)>,
        overrides: &HashMap<String, String>,
    ) -> Self {
        let mut entries: HashMap<String, String> = builtins
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces every alias token with its tokenized value, in place and
    /// recursively, so nested aliases are expanded before scanning moves on.
    ///
    /// A stream without alias tokens comes back unchanged.
    pub fn expand_tokens(&self, tokens: Vec<String>) -> Result<Vec<String>> {
        let mut arena: Vec<Expansion> = Vec::new();
        // Stack top is the next token to scan.
        let mut pending: Vec<(String, Option<usize>)> =
            tokens.into_iter().rev().map(|t| (t, None)).collect();
        let mut out = Vec::with_capacity(pending.len());

        while let Some((token, origin)) = pending.pop() {
            let Some(value) = self.get(&token) else {
                out.push(token);
                continue;
            };
            let node = Self::record(&mut arena, token, origin)?;
            pending.extend(
                split_into_tokens(value)
                    .into_iter()
                    .rev()
                    .map(|t| (t, Some(node))),
            );
        }

        Ok(out)
    }

    /// Resolves a line to the goal calls it stands for.
    ///
    /// A line equal to an alias name is replaced by the alias value; a line with
    /// several tokens is resolved token by token; anything else must be a
    /// literal `group:artifact:goal` reference.
    pub fn resolve_goal_calls(&self, line: &str) -> Result<Vec<GoalCall>> {
        let mut arena: Vec<Expansion> = Vec::new();
        let mut pending: Vec<(String, Option<usize>)> = vec![(line.trim().to_string(), None)];
        let mut calls = Vec::new();

        while let Some((text, origin)) = pending.pop() {
            if let Some(value) = self.get(&text) {
                let value = value.trim().to_string();
                let node = Self::record(&mut arena, text, origin)?;
                pending.push((value, Some(node)));
                continue;
            }

            let tokens = split_into_tokens(&text);
            if tokens.len() > 1 {
                pending.extend(tokens.into_iter().rev().map(|t| (t, origin)));
                continue;
            }

            calls.push(GoalCall::parse(&text)?);
        }

        Ok(calls)
    }

    /// Adds an expansion of `alias` below `origin`, failing if `alias` is
    /// already being expanded on that chain.
    fn record(arena: &mut Vec<Expansion>, alias: String, origin: Option<usize>) -> Result<usize> {
        let mut cursor = origin;
        while let Some(i) = cursor {
            if arena[i].alias == alias {
                return Err(ShellError::AliasExpansionCycle { alias });
            }
            cursor = arena[i].parent;
        }
        if arena.len() >= EXPANSION_LIMIT {
            return Err(ShellError::AliasExpansionCycle { alias });
        }
        arena.push(Expansion {
            alias,
            parent: origin,
        });
        Ok(arena.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> AliasTable {
        AliasTable::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn tokens(line: &str) -> Vec<String> {
        split_into_tokens(line)
    }

    #[test]
    fn test_expand_without_aliases_is_identity() {
        let aliases = table(&[("ci", "clean install")]);
        let input = tokens("core-api test -DskipTests");
        assert_eq!(aliases.expand_tokens(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_expand_splices_in_place() {
        let aliases = table(&[("ci", "clean install")]);
        let out = aliases.expand_tokens(tokens("core ci -o")).unwrap();
        assert_eq!(out, tokens("core clean install -o"));
    }

    #[test]
    fn test_expand_nested_before_moving_on() {
        let aliases = table(&[
            ("full", "ci site"),
            ("ci", "clean quick"),
            ("quick", "install -DskipTests"),
        ]);
        let out = aliases.expand_tokens(tokens("full deploy")).unwrap();
        assert_eq!(out, tokens("clean install -DskipTests site deploy"));
    }

    #[test]
    fn test_same_alias_twice_on_a_line_is_not_a_cycle() {
        let aliases = table(&[("ci", "clean install")]);
        let out = aliases.expand_tokens(tokens("ci ci")).unwrap();
        assert_eq!(out, tokens("clean install clean install"));
    }

    #[test]
    fn test_sibling_reuse_is_not_a_cycle() {
        let aliases = table(&[("both", "q q"), ("q", "test")]);
        let out = aliases.expand_tokens(tokens("both")).unwrap();
        assert_eq!(out, tokens("test test"));
    }

    #[test]
    fn test_expand_mutual_recursion_is_a_cycle() {
        let aliases = table(&[("a", "b"), ("b", "a")]);
        let err = aliases.expand_tokens(tokens("a")).unwrap_err();
        assert!(matches!(err, ShellError::AliasExpansionCycle { .. }));
    }

    #[test]
    fn test_expand_self_reference_is_a_cycle() {
        let aliases = table(&[("install", "clean install")]);
        assert_eq!(
            aliases.expand_tokens(tokens("install")),
            Err(ShellError::AliasExpansionCycle {
                alias: "install".to_string()
            })
        );
    }

    #[test]
    fn test_expand_to_nothing() {
        let aliases = table(&[("noop", "")]);
        let out = aliases.expand_tokens(tokens("noop test")).unwrap();
        assert_eq!(out, tokens("test"));
    }

    #[test]
    fn test_expansion_limit_bounds_fan_out() {
        // Each level doubles; 2^13 leaves needs more expansions than allowed.
        let names: Vec<String> = (0..14).map(|i| format!("l{}", i)).collect();
        let mut pairs = Vec::new();
        for i in 0..13 {
            pairs.push((names[i].clone(), format!("{} {}", names[i + 1], names[i + 1])));
        }
        let aliases = AliasTable::new(pairs.into_iter().collect());
        let err = aliases.expand_tokens(tokens("l0")).unwrap_err();
        assert!(matches!(err, ShellError::AliasExpansionCycle { .. }));
    }

    #[test]
    fn test_overrides_win() {
        let mut user = HashMap::new();
        user.insert("compile".to_string(), "com.acme:acme-plugin:build".to_string());
        let aliases = AliasTable::with_overrides(BUILTIN_GOALS.iter().copied(), &user);
        assert_eq!(aliases.get("compile"), Some("com.acme:acme-plugin:build"));
        assert_eq!(
            aliases.get("jar"),
            Some("org.apache.maven.plugins:maven-jar-plugin:jar")
        );
        assert_eq!(aliases.len(), BUILTIN_GOALS.len());
    }

    #[test]
    fn test_resolve_literal_reference() {
        let calls = AliasTable::default()
            .resolve_goal_calls("com.acme:acme-plugin:run")
            .unwrap();
        assert_eq!(calls, vec![GoalCall::parse("com.acme:acme-plugin:run").unwrap()]);
    }

    #[test]
    fn test_resolve_aliases_token_by_token() {
        let aliases = AliasTable::with_overrides(BUILTIN_GOALS.iter().copied(), &HashMap::new());
        let calls = aliases.resolve_goal_calls("clean compile").unwrap();
        let goals: Vec<&str> = calls.iter().map(|c| c.goal.as_str()).collect();
        assert_eq!(goals, vec!["clean", "compile"]);
        assert_eq!(calls[0].artifact_id, "maven-clean-plugin");
    }

    #[test]
    fn test_resolve_whole_line_alias_first() {
        let aliases = table(&[
            ("clean build", "x:y:z"),
            ("clean", "a:b:clean"),
            ("build", "a:b:build"),
        ]);
        let calls = aliases.resolve_goal_calls("clean build").unwrap();
        assert_eq!(calls, vec![GoalCall::parse("x:y:z").unwrap()]);
    }

    #[test]
    fn test_resolve_alias_to_alias_line() {
        let aliases = table(&[
            ("rebuild", "clean jar"),
            ("clean", "a:b:clean"),
            ("jar", "a:c:jar"),
        ]);
        let calls = aliases.resolve_goal_calls("rebuild").unwrap();
        let goals: Vec<&str> = calls.iter().map(|c| c.goal.as_str()).collect();
        assert_eq!(goals, vec!["clean", "jar"]);
    }

    #[test]
    fn test_resolve_unknown_word_is_malformed() {
        let err = AliasTable::default().resolve_goal_calls("compile").unwrap_err();
        assert_eq!(err, ShellError::MalformedGoalReference("compile".to_string()));
    }

    #[test]
    fn test_resolve_cycle() {
        let aliases = table(&[("a", "b"), ("b", "a")]);
        let err = aliases.resolve_goal_calls("a").unwrap_err();
        assert!(matches!(err, ShellError::AliasExpansionCycle { .. }));
    }

    #[test]
    fn test_resolve_cycle_through_multi_token_value() {
        let aliases = table(&[("a", "x:y:z a")]);
        let err = aliases.resolve_goal_calls("a").unwrap_err();
        assert_eq!(
            err,
            ShellError::AliasExpansionCycle {
                alias: "a".to_string()
            }
        );
    }
}
