//! Command resolution and dispatch.
//!
//! Decides *how* an item executes: either the resolved statement text itself
//! drives the behavior (direct mode), or the item's method key selects a
//! registered command (named-command mode).

mod classify;
mod registry;

pub use classify::{classify_statement, StatementKind};
pub use registry::{
    row_to_json, CommandRegistry, EntityCommand, ItemCommand, NonQueryCommand, RowMapper,
    RowSetCommand, ScalarCommand,
};

use crate::backend::{BackendSession, CommandSpec, RowSet, RowWindow, Value};
use crate::error::{CourierError, Result};
use crate::protocol::{RequestItem, ResponseFormat};

/// How the engine resolves an item's execution behavior. Chosen once per
/// engine, not per item.
#[derive(Debug, Clone, Default)]
pub enum DispatchPolicy {
    /// The statement text and requested response format drive execution.
    #[default]
    Direct,

    /// The item's method key selects a command from the registry; a missing
    /// entry is a hard item-level error.
    Registry(CommandRegistry),
}

/// What dispatch produced for one item.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Scalar, affected-count or serialized-command result.
    pub result_value: Option<Value>,

    /// Row-set result, when the item asked for rows or a procedure produced
    /// output parameters.
    pub row_set: Option<RowSet>,
}

/// Dispatches one item against a session.
///
/// The statement is prepared here so duplicate parameter names surface as a
/// statement error before anything reaches the backend.
pub async fn dispatch(
    policy: &DispatchPolicy,
    session: &dyn BackendSession,
    item: &RequestItem,
    query: &str,
) -> Result<DispatchOutcome> {
    let cmd = CommandSpec::prepare(query, item.parameters.clone())?;

    match policy {
        DispatchPolicy::Direct => dispatch_direct(session, item, &cmd).await,
        DispatchPolicy::Registry(registry) => {
            let command = registry.resolve(&item.method).ok_or_else(|| {
                CourierError::dispatch(format!(
                    "no command registered for method '{}'",
                    item.method
                ))
            })?;
            let serialized = command.execute(session, item, &cmd).await?;
            Ok(DispatchOutcome {
                result_value: Some(Value::String(serialized.to_string())),
                row_set: None,
            })
        }
    }
}

async fn dispatch_direct(
    session: &dyn BackendSession,
    item: &RequestItem,
    cmd: &CommandSpec,
) -> Result<DispatchOutcome> {
    match item.response_format {
        ResponseFormat::RowSet => {
            let window = RowWindow::new(item.first_result, item.max_results);
            let row_set = session.execute_rows(cmd, &window).await?;
            Ok(DispatchOutcome {
                result_value: None,
                row_set: Some(row_set),
            })
        }
        ResponseFormat::Scalar => {
            let value = session.execute_scalar(cmd).await?;
            Ok(DispatchOutcome {
                result_value: Some(value),
                row_set: None,
            })
        }
        ResponseFormat::None => match classify_statement(&cmd.text) {
            StatementKind::Procedure => {
                let outcome = session.execute_procedure(cmd).await?;
                Ok(DispatchOutcome {
                    row_set: Some(outcome.to_row_set()),
                    result_value: Some(outcome.return_value),
                })
            }
            StatementKind::Query | StatementKind::NonQuery => {
                let affected = session.execute_non_query(cmd).await?;
                Ok(DispatchOutcome {
                    result_value: Some(Value::Int(affected as i64)),
                    row_set: None,
                })
            }
        },
    }
}
