//! Error types shared by the demultiplexer, its sinks and the conformance
//! checker.

use thiserror::Error;

/// Everything that can go wrong while feeding a document or observing a sink.
///
/// Parse errors are returned from the `feed_*` call that consumed the
/// offending character *and* fail every sink that has not yet reached a
/// terminal state, so consumers never hang on a document that cannot
/// complete. After a fatal error the demultiplexer rejects all further input
/// with the same error.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DemuxError {
    /// The input violates JSON syntax at the current position.
    #[error("malformed input: unexpected character {found:?}, expected {expected}")]
    MalformedInput {
        /// The character that could not be accepted.
        found: char,
        /// What the lexer would have accepted instead.
        expected: &'static str,
    },

    /// An object key that is not declared in the schema (strict mode).
    #[error("unknown field {name:?}")]
    UnknownField {
        /// The undeclared key as it appeared in the input.
        name: String,
    },

    /// The value's token shape is incompatible with the field's declared kind.
    #[error("type mismatch for field {field:?}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        /// The declared kind, e.g. `"integer"`.
        expected: &'static str,
        /// A short description of what the input actually contained.
        found: String,
    },

    /// A string value that is not a member of the field's enumerated set.
    #[error("invalid value {value:?} for enumerated field {field:?}")]
    InvalidEnumValue { field: String, value: String },

    /// An integer literal outside the representable `i64` range.
    #[error("number {literal:?} overflows the integer range of field {field:?}")]
    NumericOverflow { field: String, literal: String },

    /// Non-whitespace input after the root object already closed.
    #[error("extraneous input {found:?} after the root object closed")]
    ExtraneousInput { found: char },

    /// The schema does not structurally match the external model description.
    #[error("schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },

    /// A sink operation (`resolve`, `fail`, `push`, `close`) was applied to a
    /// sink that already reached a terminal state.
    #[error("sink is already terminal")]
    AlreadyTerminal,

    /// A required field never appeared before the root object closed.
    #[error("field {name:?} was never set before the object closed")]
    MissingField { name: String },

    /// The demultiplexer was aborted by the caller.
    #[error("aborted: {reason}")]
    Aborted { reason: String },
}

impl DemuxError {
    pub(crate) fn malformed(found: char, expected: &'static str) -> Self {
        Self::MalformedInput { found, expected }
    }

    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found: found.into(),
        }
    }

    pub(crate) fn schema_mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
