//! Named-command dispatch.
//!
//! A registry maps method keys to command implementations, built once at
//! startup and handed to the engine. Unlike query-text resolution, a missing
//! registry entry is a hard item-level error: a caller naming a command that
//! does not exist is a bug, not a rollout gap.

use crate::backend::{BackendSession, ColumnInfo, CommandSpec, Row, RowWindow};
use crate::error::{CourierError, Result};
use crate::protocol::RequestItem;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A named unit of execution logic.
///
/// Commands produce an already-serialized result so heterogeneous outputs
/// can travel in one response field.
#[async_trait]
pub trait ItemCommand: Send + Sync {
    /// Executes the command against a session, returning its serialized
    /// result.
    async fn execute(
        &self,
        session: &dyn BackendSession,
        item: &RequestItem,
        cmd: &CommandSpec,
    ) -> Result<serde_json::Value>;
}

/// Registry of method key → command.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn ItemCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under a method key, replacing any previous entry.
    pub fn register(&mut self, method: impl Into<String>, command: Arc<dyn ItemCommand>) {
        self.commands.insert(method.into(), command);
    }

    /// Builder-style register.
    pub fn with_command(mut self, method: impl Into<String>, command: Arc<dyn ItemCommand>) -> Self {
        self.register(method, command);
        self
    }

    /// Looks up the command for a method key.
    pub fn resolve(&self, method: &str) -> Option<Arc<dyn ItemCommand>> {
        self.commands.get(method).cloned()
    }

    /// Returns the registered method keys, for inspection.
    pub fn methods(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Maps one materialized row to a JSON value.
pub type RowMapper = dyn Fn(&[ColumnInfo], &Row) -> serde_json::Value + Send + Sync;

/// Serializes a row as an object of column name → value.
pub fn row_to_json(columns: &[ColumnInfo], row: &Row) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (column, value) in columns.iter().zip(row.iter()) {
        object.insert(column.name.clone(), value.to_json());
    }
    serde_json::Value::Object(object)
}

/// Command that materializes rows through a row mapper and serializes the
/// list.
pub struct RowSetCommand {
    mapper: Arc<RowMapper>,
}

impl RowSetCommand {
    /// Creates a row-set command with a caller-supplied row mapper.
    pub fn new(mapper: Arc<RowMapper>) -> Self {
        Self { mapper }
    }

    /// Creates a row-set command using the column→value object mapper.
    pub fn with_default_mapper() -> Self {
        Self::new(Arc::new(row_to_json))
    }
}

#[async_trait]
impl ItemCommand for RowSetCommand {
    async fn execute(
        &self,
        session: &dyn BackendSession,
        item: &RequestItem,
        cmd: &CommandSpec,
    ) -> Result<serde_json::Value> {
        let window = RowWindow::new(item.first_result, item.max_results);
        let row_set = session.execute_rows(cmd, &window).await?;
        let mapped: Vec<serde_json::Value> = row_set
            .rows
            .iter()
            .map(|row| (self.mapper)(&row_set.columns, row))
            .collect();
        Ok(serde_json::Value::Array(mapped))
    }
}

/// Command that serializes a single execute-scalar result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarCommand;

#[async_trait]
impl ItemCommand for ScalarCommand {
    async fn execute(
        &self,
        session: &dyn BackendSession,
        _item: &RequestItem,
        cmd: &CommandSpec,
    ) -> Result<serde_json::Value> {
        let value = session.execute_scalar(cmd).await?;
        Ok(value.to_json())
    }
}

/// Command that executes a procedure and serializes its output parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonQueryCommand;

#[async_trait]
impl ItemCommand for NonQueryCommand {
    async fn execute(
        &self,
        session: &dyn BackendSession,
        _item: &RequestItem,
        cmd: &CommandSpec,
    ) -> Result<serde_json::Value> {
        let outcome = session.execute_procedure(cmd).await?;
        let mut outputs = serde_json::Map::new();
        for (name, value) in &outcome.outputs {
            outputs.insert(name.clone(), value.to_json());
        }
        Ok(serde_json::json!({
            "return_value": outcome.return_value.to_json(),
            "outputs": serde_json::Value::Object(outputs),
        }))
    }
}

/// Command that maps rows into caller-defined typed records before
/// serializing.
pub struct EntityCommand<T> {
    mapper: Arc<dyn Fn(&[ColumnInfo], &Row) -> Result<T> + Send + Sync>,
}

impl<T> EntityCommand<T> {
    /// Creates an entity command with a fallible row-to-record mapper.
    pub fn new(mapper: Arc<dyn Fn(&[ColumnInfo], &Row) -> Result<T> + Send + Sync>) -> Self {
        Self { mapper }
    }
}

#[async_trait]
impl<T> ItemCommand for EntityCommand<T>
where
    T: serde::Serialize + Send + Sync + 'static,
{
    async fn execute(
        &self,
        session: &dyn BackendSession,
        item: &RequestItem,
        cmd: &CommandSpec,
    ) -> Result<serde_json::Value> {
        let window = RowWindow::new(item.first_result, item.max_results);
        let row_set = session.execute_rows(cmd, &window).await?;
        let mut entities = Vec::with_capacity(row_set.rows.len());
        for row in &row_set.rows {
            entities.push((self.mapper)(&row_set.columns, row)?);
        }
        serde_json::to_value(entities)
            .map_err(|e| CourierError::internal(format!("entity serialization failed: {e}")))
    }
}
