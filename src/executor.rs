//! Single-item execution.
//!
//! Runs one resolved item against a session, measuring elapsed time and
//! converting every failure into an item-level error. Nothing an item does
//! may propagate past this boundary.

use std::sync::Arc;
use std::time::Instant;

use crate::backend::{BackendSession, CommandSpec};
use crate::dispatch::{dispatch, DispatchPolicy};
use crate::error::Result;
use crate::protocol::{ErrorOutcome, RequestItem, ResponseItem};

/// A request item paired with its resolved query text (empty on a catalog
/// miss).
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    /// The original request item.
    pub item: RequestItem,

    /// Resolved statement text; empty means "skip this item".
    pub query: String,
}

impl ResolvedItem {
    /// Pairs an item with its resolved query text.
    pub fn new(item: RequestItem, query: impl Into<String>) -> Self {
        Self {
            item,
            query: query.into(),
        }
    }
}

/// Executes individual items against a session.
#[derive(Clone)]
pub struct ItemExecutor {
    session: Arc<dyn BackendSession>,
    policy: Arc<DispatchPolicy>,
}

impl ItemExecutor {
    /// Creates an item executor over a session and dispatch policy.
    pub fn new(session: Arc<dyn BackendSession>, policy: Arc<DispatchPolicy>) -> Self {
        Self { session, policy }
    }

    /// Runs one item to completion.
    ///
    /// Always returns a response item: an empty query yields an inert slot
    /// with no error, and any failure during pre-queries, dispatch or
    /// post-queries is captured as exactly one item-level error. The
    /// execution time is set on every path.
    pub async fn execute(&self, resolved: ResolvedItem) -> ResponseItem {
        let start = Instant::now();
        let mut response = ResponseItem::from_request(&resolved.item, resolved.query.clone());

        if resolved.query.is_empty() {
            // Unresolvable method: a valid no-op, not a failure.
            response.execution_time = start.elapsed();
            return response;
        }

        if let Err(e) = self.run(&resolved, &mut response).await {
            tracing::warn!(
                item_id = %resolved.item.id,
                method = %resolved.item.method,
                error = %e,
                "item execution failed"
            );
            response.errors.push(ErrorOutcome::from(e));
        }

        response.execution_time = start.elapsed();
        response
    }

    async fn run(&self, resolved: &ResolvedItem, response: &mut ResponseItem) -> Result<()> {
        for statement in &resolved.item.pre_queries {
            self.run_statement(statement).await?;
        }

        let outcome = dispatch(
            &self.policy,
            self.session.as_ref(),
            &resolved.item,
            &resolved.query,
        )
        .await?;
        response.result_value = outcome.result_value;
        response.row_set = outcome.row_set;

        for statement in &resolved.item.post_queries {
            self.run_statement(statement).await?;
        }

        Ok(())
    }

    async fn run_statement(&self, statement: &str) -> Result<()> {
        self.session
            .execute_non_query(&CommandSpec::bare(statement))
            .await?;
        Ok(())
    }
}
