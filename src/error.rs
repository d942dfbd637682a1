//! Error taxonomy for the registration pipeline.
//!
//! Everything from extraction through encoding fails before any store
//! mutation is attempted; `Data` errors happen during the apply phase and
//! abort the remaining sequence without rolling back prior statements.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while locating the embedded `scriptConfig` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The declaration token never appeared on any single line.
    #[error("the scriptConfig variable is not declared in the script source")]
    DeclarationNotFound,
    /// The token was found but the text ended before any `{`.
    #[error("the scriptConfig object is missing its starting {{ character")]
    MissingOpenBrace,
    /// The object opened but the text ended with unbalanced braces.
    #[error("the scriptConfig object is missing a closing }} character")]
    MissingCloseBrace,
}

/// Entity level at which a validation rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Script,
    ScriptVar,
    LaunchPoint,
    LaunchPointVar,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Script => "scriptConfig",
            Self::ScriptVar => "scriptConfig.scriptVars",
            Self::LaunchPoint => "scriptConfig.launchPoints",
            Self::LaunchPointVar => "scriptConfig.launchPoints.launchPointVars",
        };
        f.write_str(label)
    }
}

/// A cross-field validation failure, pointing at the exact entity and rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} {name:?} must provide the {field} attribute")]
    MissingField {
        entity: EntityKind,
        name: String,
        field: &'static str,
    },
    #[error("{entity} {name:?}: {rule}")]
    Rule {
        entity: EntityKind,
        name: String,
        rule: String,
    },
}

impl ValidationError {
    /// The attribute the rule fired on, when the rule concerns one attribute.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. } => Some(field),
            Self::Rule { .. } => None,
        }
    }
}

/// Error surfaced by a relational executor implementation.
#[derive(Debug, Error)]
#[error("data error: {0}")]
pub struct DataError(pub String);

/// Top-level error for one script operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A required statement attribute was not supplied by the caller.
    #[error("the {0} attribute is required")]
    MissingInput(&'static str),
    /// The script path resolved to neither candidate location.
    #[error("the script file {} cannot be found", .0.display())]
    FileNotFound(PathBuf),
    #[error("read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// The extracted object was not a well-formed object literal.
    #[error("malformed scriptConfig object ({message}): {snippet}")]
    Decode { message: String, snippet: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The relational executor rejected an operation during apply.
    #[error(transparent)]
    Data(#[from] DataError),
    /// No statement is registered under the requested command name.
    #[error("unknown change statement {0:?}")]
    UnknownStatement(String),
}
