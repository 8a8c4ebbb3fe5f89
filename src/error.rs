use thiserror::Error;

/// Errors raised while turning a command line into build invocations.
///
/// Both kinds abandon the offending line only; the session keeps reading input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// A token is neither an alias nor a `group:artifact:goal` reference.
    #[error("malformed goal reference '{0}', expected GROUP_ID:ARTIFACT_ID:GOAL")]
    MalformedGoalReference(String),

    /// Alias expansion revisited an alias it was already expanding, or ran past
    /// the expansion budget.
    #[error("alias '{alias}' expands into itself")]
    AliasExpansionCycle { alias: String },
}

pub type Result<T> = std::result::Result<T, ShellError>;
