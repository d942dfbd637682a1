//! Registers scripted extensions whose configuration is embedded as a
//! `scriptConfig` object literal in the script source.
//!
//! Pipeline: [`extract`] pulls the object out of raw source text, [`schema`]
//! decodes it, [`validate`] enforces the cross-field rules, [`events`]
//! collapses trigger flags into event codes, and [`plan`] turns the result
//! into an ordered operation sequence for an external relational executor.
//! [`statement`] wraps the pipeline in the change-statement commands the
//! host installer drives.

pub mod error;
pub mod events;
pub mod extract;
pub mod plan;
pub mod schema;
pub mod sql;
pub mod statement;
pub mod validate;

pub use error::{DataError, EntityKind, Error, ExtractError, ValidationError};
pub use schema::{LaunchKind, LaunchPoint, LaunchPointVar, ScriptConfig, ScriptVar};
pub use sql::{Operation, RelationalExecutor, SqlValue};
