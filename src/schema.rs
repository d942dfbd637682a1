//! Typed view of the embedded `scriptConfig` object.
//!
//! Field names mirror the JSON keys script authors write; unknown keys are
//! ignored. Required string attributes default to empty rather than failing
//! the decode, so a missing attribute surfaces as a validation error naming
//! the entity and field instead of a decode error. Optional collections stay
//! `Option` so that an absent list is distinguishable from a present but
//! empty one.

use crate::error::Error;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// Root of the embedded configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub allow_invoking_functions: bool,
    #[serde(default)]
    pub script_vars: Option<Vec<ScriptVar>>,
    #[serde(default)]
    pub launch_points: Option<Vec<LaunchPoint>>,
}

/// A script-scoped variable binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptVar {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: String,
    #[serde(default)]
    pub binding_type: String,
    #[serde(default)]
    pub binding_value: Option<String>,
    #[serde(default)]
    pub literal_data_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allow_override: bool,
    #[serde(default)]
    pub no_validation: bool,
    #[serde(default)]
    pub no_access_check: bool,
    #[serde(default)]
    pub no_action: bool,
}

/// A binding of the script to a triggering event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPoint {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub launch_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub attribute_name: Option<String>,
    #[serde(default)]
    pub action_name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub initialize_value: bool,
    #[serde(default)]
    pub validate_application: bool,
    #[serde(default)]
    pub allow_object_creation: bool,
    #[serde(default)]
    pub allow_object_deletion: bool,
    #[serde(default)]
    pub save: bool,
    #[serde(default)]
    pub add: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub before_save: bool,
    #[serde(default)]
    pub after_save: bool,
    #[serde(default)]
    pub after_commit: bool,
    #[serde(default)]
    pub initialize_access_restriction: bool,
    #[serde(default)]
    pub validate: bool,
    #[serde(default)]
    pub retrieve_list: bool,
    #[serde(default)]
    pub run_action: bool,
    #[serde(default)]
    pub launch_point_vars: Option<Vec<LaunchPointVar>>,
}

/// A variable binding scoped to one launch point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPointVar {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub binding_value: Option<String>,
}

/// Launch point discriminator, compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    Object,
    Attribute,
    Action,
}

impl LaunchKind {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("OBJECT") {
            Some(Self::Object)
        } else if value.eq_ignore_ascii_case("ATTRIBUTE") {
            Some(Self::Attribute)
        } else if value.eq_ignore_ascii_case("ACTION") {
            Some(Self::Action)
        } else {
            None
        }
    }
}

impl LaunchPoint {
    /// Discriminator parsed from the raw `type` attribute.
    pub fn kind(&self) -> Option<LaunchKind> {
        LaunchKind::parse(&self.launch_type)
    }
}

/// Upper bound on the snippet echoed in decode errors.
const SNIPPET_MAX_BYTES: usize = 240;

/// Deserializes the extracted object text into the configuration tree.
pub fn decode_config(text: &str) -> Result<ScriptConfig, Error> {
    serde_json::from_str(text).map_err(|err| Error::Decode {
        message: err.to_string(),
        snippet: truncate(text, SNIPPET_MAX_BYTES),
    })
}

fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}
