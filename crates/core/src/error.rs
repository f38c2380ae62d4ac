//! Error taxonomy for stub generation.
//!
//! Everything except [`StubError::UnsupportedRootConstruct`] aborts the run. That one is
//! reported as a warning and the offending member is left out of the stub.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StubError>;

#[derive(Debug, Error)]
pub enum StubError {
    /// A documentation type annotation does not match the supported mini-grammar.
    #[error("not able to parse type \"{input}\": {reason}")]
    MalformedTypeExpression { input: String, reason: String },

    /// A `:type` directive names a parameter that the runtime signature does not have.
    #[error(
        "the parameter {parameter} is defined in the documentation of {callable} but not in its signature"
    )]
    UnknownParameterInDoc { callable: String, parameter: String },

    /// More than one `:return:` (or `:rtype:`) line in a single documentation body.
    #[error("multiple return annotations found with {directive} ({count} lines)")]
    AmbiguousReturnDoc { directive: &'static str, count: usize },

    /// A module-level member that is neither a class nor a builtin function.
    #[error("unsupported root construction {name}")]
    UnsupportedRootConstruct { name: String },

    /// The parameter list reported by reflection breaks the signature invariants.
    #[error("invalid signature for {callable}: {reason}")]
    InvalidSignature { callable: String, reason: String },

    /// The external formatter could not be run or exited with a failure.
    #[error("formatting failed: {reason}")]
    FormattingFailed { reason: String },

    #[error("module {name} not found (looked for {})", path.display())]
    ModuleNotFound { name: String, path: PathBuf },

    #[error("invalid reflection dump {}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StubError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        StubError::MalformedTypeExpression { input: input.to_string(), reason: reason.into() }
    }

    /// Whether the error aborts stub generation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StubError::UnsupportedRootConstruct { .. })
    }
}
