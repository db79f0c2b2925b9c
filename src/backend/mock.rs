//! Mock backend for testing.
//!
//! An in-memory repository with scripted per-statement outcomes. Non-query
//! effects run outside a transaction are published immediately; effects run
//! inside a mock transaction are staged and only published on commit, which
//! is what makes all-or-nothing behavior observable in tests.

use super::{
    BackendRepository, BackendSession, BackendTransaction, ColumnInfo, CommandSpec,
    IsolationLevel, ProcedureOutcome, Row, RowSet, RowWindow, Value,
};
use crate::error::{CourierError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Scripted outcome for a statement text.
#[derive(Debug, Clone)]
enum Scripted {
    Rows(RowSet),
    Scalar(Value),
    Affected(u64),
    Procedure(ProcedureOutcome),
    Fail(String),
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<String, Scripted>>,
    delays_ms: Mutex<HashMap<String, u64>>,
    executed: Mutex<Vec<String>>,
    published: Mutex<Vec<String>>,
    fail_commit: AtomicBool,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockState {
    fn script_for(&self, text: &str) -> Option<Scripted> {
        locked(&self.scripts).get(text).cloned()
    }

    async fn record(&self, text: &str) -> Result<Option<Scripted>> {
        locked(&self.executed).push(text.to_string());

        let delay = locked(&self.delays_ms).get(text).copied();
        if let Some(ms) = delay {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        match self.script_for(text) {
            Some(Scripted::Fail(message)) => Err(CourierError::backend(message)),
            other => Ok(other),
        }
    }
}

/// A mock backend repository that returns scripted results.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    /// Creates a new mock backend with no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a row-set result for the given statement text.
    pub fn script_rows(&self, text: impl Into<String>, columns: Vec<ColumnInfo>, rows: Vec<Row>) {
        locked(&self.state.scripts).insert(
            text.into(),
            Scripted::Rows(RowSet::with_data(columns, rows)),
        );
    }

    /// Scripts a scalar result for the given statement text.
    pub fn script_scalar(&self, text: impl Into<String>, value: impl Into<Value>) {
        locked(&self.state.scripts).insert(text.into(), Scripted::Scalar(value.into()));
    }

    /// Scripts an affected-row count for the given statement text.
    pub fn script_affected(&self, text: impl Into<String>, affected: u64) {
        locked(&self.state.scripts).insert(text.into(), Scripted::Affected(affected));
    }

    /// Scripts a stored-procedure outcome for the given statement text.
    pub fn script_procedure(&self, text: impl Into<String>, outcome: ProcedureOutcome) {
        locked(&self.state.scripts).insert(text.into(), Scripted::Procedure(outcome));
    }

    /// Scripts a failure for the given statement text.
    pub fn script_failure(&self, text: impl Into<String>, message: impl Into<String>) {
        locked(&self.state.scripts).insert(text.into(), Scripted::Fail(message.into()));
    }

    /// Adds an artificial delay before the given statement completes.
    pub fn script_delay(&self, text: impl Into<String>, delay_ms: u64) {
        locked(&self.state.delays_ms).insert(text.into(), delay_ms);
    }

    /// Makes every subsequent commit fail.
    pub fn fail_commits(&self, fail: bool) {
        self.state.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns every statement executed so far, in execution order.
    pub fn executed_statements(&self) -> Vec<String> {
        locked(&self.state.executed).clone()
    }

    /// Returns the write effects that have been published (committed).
    pub fn published_effects(&self) -> Vec<String> {
        locked(&self.state.published).clone()
    }
}

#[async_trait]
impl BackendSession for MockBackend {
    async fn execute_rows(&self, cmd: &CommandSpec, window: &RowWindow) -> Result<RowSet> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Rows(row_set)) => Ok(RowSet {
                columns: row_set.columns,
                rows: window.apply(row_set.rows),
            }),
            _ => Ok(RowSet::new()),
        }
    }

    async fn execute_scalar(&self, cmd: &CommandSpec) -> Result<Value> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Scalar(value)) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    async fn execute_non_query(&self, cmd: &CommandSpec) -> Result<u64> {
        let script = self.state.record(&cmd.text).await?;
        // Auto-commit mode: the effect is visible immediately.
        locked(&self.state.published).push(cmd.text.clone());
        match script {
            Some(Scripted::Affected(affected)) => Ok(affected),
            _ => Ok(0),
        }
    }

    async fn execute_procedure(&self, cmd: &CommandSpec) -> Result<ProcedureOutcome> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Procedure(outcome)) => Ok(outcome),
            _ => Ok(ProcedureOutcome::default()),
        }
    }
}

#[async_trait]
impl BackendRepository for MockBackend {
    async fn begin_transaction(
        &self,
        _isolation: IsolationLevel,
    ) -> Result<Arc<dyn BackendTransaction>> {
        Ok(Arc::new(MockTransaction {
            state: self.state.clone(),
            staged: Mutex::new(Vec::new()),
            finished: AtomicBool::new(false),
        }))
    }
}

/// A mock transaction that stages write effects until commit.
pub struct MockTransaction {
    state: Arc<MockState>,
    staged: Mutex<Vec<String>>,
    finished: AtomicBool,
}

#[async_trait]
impl BackendSession for MockTransaction {
    async fn execute_rows(&self, cmd: &CommandSpec, window: &RowWindow) -> Result<RowSet> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Rows(row_set)) => Ok(RowSet {
                columns: row_set.columns,
                rows: window.apply(row_set.rows),
            }),
            _ => Ok(RowSet::new()),
        }
    }

    async fn execute_scalar(&self, cmd: &CommandSpec) -> Result<Value> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Scalar(value)) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    async fn execute_non_query(&self, cmd: &CommandSpec) -> Result<u64> {
        let script = self.state.record(&cmd.text).await?;
        locked(&self.staged).push(cmd.text.clone());
        match script {
            Some(Scripted::Affected(affected)) => Ok(affected),
            _ => Ok(0),
        }
    }

    async fn execute_procedure(&self, cmd: &CommandSpec) -> Result<ProcedureOutcome> {
        match self.state.record(&cmd.text).await? {
            Some(Scripted::Procedure(outcome)) => Ok(outcome),
            _ => Ok(ProcedureOutcome::default()),
        }
    }
}

#[async_trait]
impl BackendTransaction for MockTransaction {
    async fn commit(&self) -> Result<()> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(CourierError::transaction("transaction already completed"));
        }
        if self.state.fail_commit.load(Ordering::SeqCst) {
            // Commit failure leaves the transaction open for rollback.
            return Err(CourierError::transaction("scripted commit failure"));
        }
        self.finished.store(true, Ordering::SeqCst);
        let staged: Vec<String> = locked(&self.staged).drain(..).collect();
        locked(&self.state.published).extend(staged);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        locked(&self.staged).clear();
        Ok(())
    }
}
