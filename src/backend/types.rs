//! Data types shared between the engine and backend implementations.
//!
//! Defines the value model, row-set shape, prepared command and paging
//! window used by every backend call.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{CourierError, Result};

/// Represents a single value exchanged with a backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts the value into a JSON value for serialized command results.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// A named parameter bound to a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,

    /// Bound value.
    pub value: Value,
}

impl Parameter {
    /// Creates a new parameter with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Metadata about a column in a row set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data, positionally aligned with its row set's columns.
pub type Row = Vec<Value>;

/// An ordered collection of rows with column metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowSet {
    /// Column metadata for the rows.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl RowSet {
    /// Creates a new empty row set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row set with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns true if the row set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A paging window over a cursor.
///
/// Unset bounds mean "from the start" and "to the end" respectively, so the
/// default window materializes the whole cursor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowWindow {
    /// Zero-based index of the first row to return.
    pub first_result: Option<u64>,

    /// Maximum number of rows to return.
    pub max_results: Option<u64>,
}

impl RowWindow {
    /// Creates a window from optional bounds.
    pub fn new(first_result: Option<u64>, max_results: Option<u64>) -> Self {
        Self {
            first_result,
            max_results,
        }
    }

    /// Returns true if the window covers the entire cursor.
    pub fn is_unbounded(&self) -> bool {
        self.first_result.is_none() && self.max_results.is_none()
    }

    /// Applies the window to an already-materialized set of rows.
    ///
    /// Backends with real cursors should push the window down instead; this
    /// is the reference skip/take semantics they must match.
    pub fn apply(&self, rows: Vec<Row>) -> Vec<Row> {
        let skip = self.first_result.unwrap_or(0) as usize;
        match self.max_results {
            Some(take) => rows.into_iter().skip(skip).take(take as usize).collect(),
            None => rows.into_iter().skip(skip).collect(),
        }
    }
}

/// A prepared command: statement text plus its ordered parameter bindings.
///
/// Preparation is pure; no backend is touched until the command is handed to
/// a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSpec {
    /// Statement text.
    pub text: String,

    /// Ordered parameter bindings.
    pub parameters: Vec<Parameter>,
}

impl CommandSpec {
    /// Prepares a command from statement text and parameters.
    ///
    /// Duplicate parameter names are rejected outright rather than left to
    /// backend-specific binding order.
    pub fn prepare(text: impl Into<String>, parameters: Vec<Parameter>) -> Result<Self> {
        let mut seen = HashSet::new();
        for parameter in &parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(CourierError::statement(format!(
                    "duplicate parameter name '{}'",
                    parameter.name
                )));
            }
        }

        Ok(Self {
            text: text.into(),
            parameters,
        })
    }

    /// Prepares a bare statement with no parameters.
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }
}

/// Output of a stored-procedure execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcedureOutcome {
    /// The procedure's return value.
    pub return_value: Value,

    /// Named output parameters, in declaration order.
    pub outputs: Vec<(String, Value)>,
}

impl ProcedureOutcome {
    /// Renders the output parameters as a single synthetic row.
    pub fn to_row_set(&self) -> RowSet {
        let columns = self
            .outputs
            .iter()
            .map(|(name, _)| ColumnInfo::new(name.clone(), "output"))
            .collect();
        let row = self.outputs.iter().map(|(_, value)| value.clone()).collect();
        RowSet::with_data(columns, vec![row])
    }
}
