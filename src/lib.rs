//! An interactive command shell for driving a multi-module build.
//!
//! Short command lines are expanded through aliases and wildcard module
//! selectors into build invocations (target modules, phases or goals, and
//! properties), each handed to an external build tool. For example, with an
//! alias `ci = "clean install"`, the line
//!
//! ```text
//! core-* ci -DskipTests web test
//! ```
//!
//! runs `clean install` with `skipTests` on every module whose id starts with
//! `core-`, then `test` on `web`.
//!
//! The main entry point is [`Interpreter`], which evaluates lines against a
//! [`modules::ModuleRegistry`] and forwards the resulting calls to a
//! [`command::Dispatcher`]. The command-language pieces ([`lexer`], [`alias`],
//! [`parser`], [`completion`]) are public and usable on their own.

pub mod alias;
pub mod command;
pub mod completion;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod goal;
mod interpreter;
pub mod lexer;
pub mod modules;
pub mod parser;

/// Just a convenient re-export of the session types.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{
    DEFAULT_PHASES, DEFAULT_PROPERTIES, DispatchReport, EXIT_COMMANDS, Interpreter,
    LIST_COMMANDS, Mode, Outcome,
};
