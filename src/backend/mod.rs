//! Backend repository abstraction.
//!
//! Provides the trait seam between the batch engine and whatever actually
//! executes commands. The engine never talks to a driver directly; it only
//! sees sessions, and a transaction is just a session with commit/rollback.

mod mock;
mod types;

pub use mock::MockBackend;
pub use types::{
    ColumnInfo, CommandSpec, Parameter, ProcedureOutcome, Row, RowSet, RowWindow, Value,
};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transaction isolation levels understood by backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Returns the isolation level as a SQL keyword string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Something commands can be executed against: a plain connection or an open
/// transaction.
///
/// All operations are async and return Results with CourierError.
#[async_trait]
pub trait BackendSession: Send + Sync {
    /// Executes a command and materializes the windowed rows of its cursor.
    async fn execute_rows(&self, cmd: &CommandSpec, window: &RowWindow) -> Result<RowSet>;

    /// Executes a command and returns its single scalar result.
    async fn execute_scalar(&self, cmd: &CommandSpec) -> Result<Value>;

    /// Executes a command that returns no rows; yields the affected count.
    async fn execute_non_query(&self, cmd: &CommandSpec) -> Result<u64>;

    /// Executes a stored procedure, capturing outputs and the return value.
    async fn execute_procedure(&self, cmd: &CommandSpec) -> Result<ProcedureOutcome>;
}

/// A backend repository: a session factory for transactions plus direct
/// (auto-commit) execution.
#[async_trait]
pub trait BackendRepository: BackendSession {
    /// Opens a transaction at the given isolation level.
    ///
    /// The handle is shared (`Arc`) because ordered-parallel batches execute
    /// multiple items against one transaction; whether that is actually safe
    /// is the implementation's contract, not the engine's.
    async fn begin_transaction(
        &self,
        isolation: IsolationLevel,
    ) -> Result<Arc<dyn BackendTransaction>>;
}

/// An open transaction. Commit and rollback take `&self` so the handle can be
/// shared across concurrently executing items; implementations must make the
/// terminal call win exactly once.
#[async_trait]
pub trait BackendTransaction: BackendSession {
    /// Commits the transaction.
    async fn commit(&self) -> Result<()>;

    /// Rolls the transaction back, discarding staged effects.
    async fn rollback(&self) -> Result<()>;
}
