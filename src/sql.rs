//! Relational operations the planner emits and the executor contract that
//! consumes them.
//!
//! Statement text generation is deliberately small: the target store accepts
//! `sysdate` for the now sentinel and 1/0 for booleans, and text values are
//! quote-escaped. Large text cannot ride the bulk insert path, so it is
//! written through a separate keyed update.

use crate::error::DataError;
use serde::Serialize;
use std::fmt;

/// A typed column value in a parameterized insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlValue {
    Text(String),
    Bool(bool),
    Int(i64),
    /// The store's current-timestamp expression.
    Now,
}

impl SqlValue {
    fn render(&self) -> String {
        match self {
            Self::Text(value) => quote(value),
            Self::Bool(value) => {
                if *value {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            Self::Int(value) => value.to_string(),
            Self::Now => "sysdate".to_string(),
        }
    }
}

/// One step of a registration plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Operation {
    /// Parameterized insert with ordered column/value pairs.
    Insert {
        table: &'static str,
        columns: Vec<(&'static str, SqlValue)>,
    },
    /// Raw delete by predicate.
    Delete {
        table: &'static str,
        predicate: String,
    },
    /// Two-phase large-text write: create the value, then update by key.
    StoreText {
        table: &'static str,
        column: &'static str,
        key_column: &'static str,
        key: String,
        value: String,
    },
}

impl Operation {
    /// Statement text for display and for executors that speak plain SQL.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Insert { table, columns } => {
                let names = columns
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ");
                let values = columns
                    .iter()
                    .map(|(_, value)| value.render())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("insert into {table} ({names}) values ({values})")
            }
            Self::Delete { table, predicate } => {
                format!("delete from {table} where {predicate}")
            }
            Self::StoreText {
                table,
                column,
                key_column,
                key,
                value,
            } => format!(
                "update {table} set {column} = {} where {key_column} = {}",
                quote(value),
                quote(key)
            ),
        }
    }

    /// Target table of the operation.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Insert { table, .. } | Self::Delete { table, .. } | Self::StoreText { table, .. } => table,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// External relational store boundary. Statements arrive strictly in plan
/// order; implementations own connections, transactions and retries.
pub trait RelationalExecutor {
    fn execute(&mut self, op: &Operation) -> Result<(), DataError>;
}

pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
