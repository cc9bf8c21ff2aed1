//! Error types for the filter query compiler

use crate::schema::{EntityKind, JoinKind};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of a compilation. Each stage fails on its first error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl Error {
    /// `true` when the error was caused by the user's expression rather than
    /// by an internal inconsistency.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Error::Build(_))
    }
}

/// Malformed expression text (lexical or syntactic).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parse error at position {position} near '{fragment}': {message}")]
pub struct ParseError {
    /// Character offset into the expression
    pub position: usize,
    /// Source text starting at `position`
    pub fragment: String,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            position,
            fragment: fragment.into(),
            message: message.into(),
        }
    }
}

/// Semantic errors raised while checking an expression against an entity schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown attribute '{name}' for {kind}")]
    UnknownAttribute { name: String, kind: EntityKind },

    #[error("'{reference}' cannot be used to filter {kind}")]
    NotApplicable { reference: String, kind: EntityKind },

    #[error("Malformed neighbor index in '{reference}' for {kind}")]
    MalformedNeighborIndex { reference: String, kind: EntityKind },

    #[error("Unknown value kind '{value_kind}' in '{reference}' for {kind}, expected int_value, double_value or string_value")]
    UnknownValueKind {
        value_kind: String,
        reference: String,
        kind: EntityKind,
    },

    #[error("Malformed field reference '{reference}' for {kind}")]
    MalformedReference { reference: String, kind: EntityKind },

    #[error("Expression too deeply nested for {kind} (max depth: {max_depth})")]
    TooDeep { max_depth: usize, kind: EntityKind },
}

/// Internal invariant violations of the query builder.
///
/// Any expression that resolved against a schema must build against the same
/// schema, so these indicate a bug rather than bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("No {join} join is defined for {kind}")]
    MissingJoinTemplate { join: JoinKind, kind: EntityKind },
}
