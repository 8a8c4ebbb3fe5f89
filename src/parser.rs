//! Partitioning of an alias-expanded token stream into invocation groups.
//!
//! Every token is first classified into a [`TokenKind`]; a small state machine
//! then folds the classified tokens into [`InvocationGroup`]s. Module tokens
//! mark a group boundary once the open group already has commands, so
//! `core build api test` yields two groups while `core api build` yields one.

use crate::modules::{Module, ModuleRegistry, is_selector};
use std::collections::BTreeMap;
use std::fmt;

/// Leading characters stripped from a property token, e.g. `-D` in `-Dskip=true`.
pub const DEFAULT_PROPERTY_PREFIX_WIDTH: usize = 2;

const PROPERTY_PREFIX: char = '-';

/// What a single token means to the grouper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'r> {
    /// A known module id or a wildcard selector, with the modules it resolved
    /// to. A selector that matched nothing carries an empty list.
    Modules(Vec<&'r Module>),
    /// A `-` token, already split into key and value.
    Property { key: String, value: String },
    /// Anything else: a phase or goal name.
    Command(String),
}

/// Classifies `token` against the known modules.
///
/// Literal module ids win over everything else; then wildcard selectors,
/// property flags and finally plain commands.
pub fn classify<'r>(
    token: &str,
    registry: &'r ModuleRegistry,
    prefix_width: usize,
) -> TokenKind<'r> {
    if let Some(module) = registry.get(token) {
        TokenKind::Modules(vec![module])
    } else if is_selector(token) {
        TokenKind::Modules(registry.select(token))
    } else if token.starts_with(PROPERTY_PREFIX) {
        let (key, value) = parse_property(token, prefix_width);
        TokenKind::Property { key, value }
    } else {
        TokenKind::Command(token.to_string())
    }
}

/// Strips exactly `prefix_width` characters and splits the rest on the first `=`.
/// A missing `=` gives an empty value.
pub fn parse_property(token: &str, prefix_width: usize) -> (String, String) {
    let body = match token.char_indices().nth(prefix_width) {
        Some((i, _)) => &token[i..],
        None => "",
    };
    match body.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (body.to_string(), String::new()),
    }
}

/// One build dispatch: which modules, which phases or goals, which properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationGroup<'r> {
    /// Target modules in the order they were named. Empty means the current project.
    pub modules: Vec<&'r Module>,
    /// Phase or goal names, duplicates allowed.
    pub commands: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl fmt::Display for InvocationGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<&str> = self.modules.iter().map(|m| m.id.as_str()).collect();
        write!(f, "{:?} on {:?}", self.commands, modules)?;
        if !self.properties.is_empty() {
            write!(f, " with {:?}", self.properties)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupingState {
    NoGroup,
    Open,
}

struct GroupBuilder<'r> {
    registry: &'r ModuleRegistry,
    prefix_width: usize,
    groups: Vec<InvocationGroup<'r>>,
    state: GroupingState,
}

impl<'r> GroupBuilder<'r> {
    fn new(registry: &'r ModuleRegistry, prefix_width: usize) -> Self {
        GroupBuilder {
            registry,
            prefix_width,
            groups: Vec::new(),
            state: GroupingState::NoGroup,
        }
    }

    fn build(mut self, tokens: &[String]) -> Vec<InvocationGroup<'r>> {
        for token in tokens {
            match classify(token, self.registry, self.prefix_width) {
                TokenKind::Modules(modules) => self.add_modules(modules),
                TokenKind::Property { key, value } => self.add_property(key, value),
                TokenKind::Command(command) => self.add_command(command),
            }
        }
        self.groups
    }

    fn open(&mut self, group: InvocationGroup<'r>) -> &mut InvocationGroup<'r> {
        self.groups.push(group);
        self.state = GroupingState::Open;
        self.current()
    }

    fn current(&mut self) -> &mut InvocationGroup<'r> {
        // Only reachable in the Open state, which always has a last group.
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn add_modules(&mut self, modules: Vec<&'r Module>) {
        if modules.is_empty() {
            return;
        }
        let reuse = self.state == GroupingState::Open
            && self.groups.last().is_some_and(|g| g.commands.is_empty());
        let group = if reuse {
            self.current()
        } else {
            self.open(InvocationGroup::default())
        };
        group.modules.extend(modules);
    }

    fn add_property(&mut self, key: String, value: String) {
        let group = if self.state == GroupingState::Open {
            self.current()
        } else {
            self.open(InvocationGroup::default())
        };
        group.properties.insert(key, value);
    }

    fn add_command(&mut self, command: String) {
        let group = if self.state == GroupingState::Open {
            self.current()
        } else {
            let current = self.registry.current();
            self.open(InvocationGroup {
                modules: vec![current],
                ..Default::default()
            })
        };
        group.commands.push(command);
    }
}

/// Folds alias-expanded tokens into invocation groups, in dispatch order.
pub fn group_tokens<'r>(
    tokens: &[String],
    registry: &'r ModuleRegistry,
    prefix_width: usize,
) -> Vec<InvocationGroup<'r>> {
    GroupBuilder::new(registry, prefix_width).build(tokens)
}
