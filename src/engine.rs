//! Batch orchestration.
//!
//! The engine turns one request envelope into one response envelope: it
//! resolves query text, opens a transaction when asked to, runs the items
//! sequentially or fanned out across workers, and keeps the strict separation
//! between item-level failures (data in the response) and orchestration
//! failures (message-level errors that roll the transaction back).

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::backend::{BackendRepository, BackendSession, CommandSpec};
use crate::catalog::QueryCatalog;
use crate::config::EngineOptions;
use crate::dispatch::DispatchPolicy;
use crate::error::{CourierError, Result};
use crate::executor::{ItemExecutor, ResolvedItem};
use crate::protocol::{ErrorOutcome, RequestEnvelope, ResponseEnvelope, ResponseItem};

/// Executes request envelopes against a backend repository.
pub struct BatchEngine {
    repository: Arc<dyn BackendRepository>,
    catalog: Arc<dyn QueryCatalog>,
    dispatch: Arc<DispatchPolicy>,
    options: EngineOptions,
}

/// An orchestration failure, carrying whatever items completed before it.
struct OrchestrationFailure {
    items: Vec<ResponseItem>,
    error: CourierError,
}

impl BatchEngine {
    /// Creates an engine with direct dispatch and default options.
    pub fn new(repository: Arc<dyn BackendRepository>, catalog: Arc<dyn QueryCatalog>) -> Self {
        Self {
            repository,
            catalog,
            dispatch: Arc::new(DispatchPolicy::Direct),
            options: EngineOptions::default(),
        }
    }

    /// Replaces the dispatch policy.
    pub fn with_dispatch(mut self, dispatch: DispatchPolicy) -> Self {
        self.dispatch = Arc::new(dispatch);
        self
    }

    /// Replaces the engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes one envelope.
    ///
    /// Always returns a response. An absent request yields an empty response
    /// with a single protocol error; any orchestration failure is appended to
    /// the response's message-level errors after the transaction (if any) has
    /// been rolled back.
    pub async fn execute(&self, request: Option<RequestEnvelope>) -> ResponseEnvelope {
        let request = match request {
            Some(request) => request,
            None => return ResponseEnvelope::no_request(),
        };

        let mut response = ResponseEnvelope::new(request.message_id.clone());
        tracing::debug!(
            message_id = %request.message_id,
            items = request.items.len(),
            transactional = request.transactional,
            parallel = request.parallel,
            "executing envelope"
        );

        if request.parallel && request.transactional {
            if self.options.forbid_parallel_transactions {
                response.errors.push(ErrorOutcome::from(CourierError::protocol(
                    "parallel execution inside a transaction is disabled",
                )));
                return response;
            }
            tracing::warn!(
                message_id = %request.message_id,
                "parallel items share one transaction; interleaving is backend-defined"
            );
        }

        let resolved: Vec<ResolvedItem> = request
            .items
            .iter()
            .map(|item| {
                let query = self.catalog.resolve(&item.method).unwrap_or_default();
                ResolvedItem::new(item.clone(), query)
            })
            .collect();

        match self.orchestrate(&request, resolved).await {
            Ok(items) => response.items = items,
            Err(failure) => {
                tracing::error!(
                    message_id = %request.message_id,
                    error = %failure.error,
                    "envelope orchestration failed"
                );
                response.items = failure.items;
                response.errors.push(ErrorOutcome::from(failure.error));
            }
        }

        response
    }

    async fn orchestrate(
        &self,
        request: &RequestEnvelope,
        resolved: Vec<ResolvedItem>,
    ) -> std::result::Result<Vec<ResponseItem>, OrchestrationFailure> {
        let transaction = if request.transactional {
            match self.repository.begin_transaction(self.options.isolation).await {
                Ok(tx) => Some(tx),
                Err(error) => {
                    return Err(OrchestrationFailure {
                        items: Vec::new(),
                        error,
                    })
                }
            }
        } else {
            None
        };

        let session: Arc<dyn BackendSession> = match &transaction {
            Some(tx) => tx.clone(),
            None => self.repository.clone(),
        };

        let result = self.run_batch(request, resolved, session).await;

        match (result, transaction) {
            (Ok(items), Some(tx)) => {
                if let Err(error) = tx.commit().await {
                    let _ = tx.rollback().await;
                    return Err(OrchestrationFailure { items, error });
                }
                Ok(items)
            }
            (Ok(items), None) => Ok(items),
            (Err(failure), Some(tx)) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::error!(error = %rollback_error, "rollback failed");
                }
                Err(failure)
            }
            (Err(failure), None) => Err(failure),
        }
    }

    /// Runs message pre-queries, all items, then message post-queries.
    async fn run_batch(
        &self,
        request: &RequestEnvelope,
        resolved: Vec<ResolvedItem>,
        session: Arc<dyn BackendSession>,
    ) -> std::result::Result<Vec<ResponseItem>, OrchestrationFailure> {
        if let Err(error) = run_statements(session.as_ref(), &request.pre_queries).await {
            return Err(OrchestrationFailure {
                items: Vec::new(),
                error,
            });
        }

        let executor = ItemExecutor::new(session.clone(), self.dispatch.clone());
        let items = if request.parallel {
            self.run_parallel(&executor, resolved).await?
        } else {
            let mut items = Vec::with_capacity(resolved.len());
            for item in resolved {
                items.push(executor.execute(item).await);
            }
            items
        };

        if let Err(error) = run_statements(session.as_ref(), &request.post_queries).await {
            return Err(OrchestrationFailure { items, error });
        }

        Ok(items)
    }

    /// Fans items out across workers, preserving request order in the output.
    ///
    /// Tasks are spawned in request order and their handles awaited in the
    /// same order, so completion order never leaks into the response.
    async fn run_parallel(
        &self,
        executor: &ItemExecutor,
        resolved: Vec<ResolvedItem>,
    ) -> std::result::Result<Vec<ResponseItem>, OrchestrationFailure> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallelism.max(1)));

        let handles: Vec<_> = resolved
            .into_iter()
            .map(|item| {
                let executor = executor.clone();
                let semaphore = semaphore.clone();
                tokio::spawn(async move {
                    // Closed only on drop, so acquire cannot fail here.
                    let _permit = semaphore.acquire_owned().await;
                    executor.execute(item).await
                })
            })
            .collect();

        let mut items = Vec::with_capacity(handles.len());
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(item) => items.push(item),
                Err(error) => {
                    return Err(OrchestrationFailure {
                        items,
                        error: CourierError::internal(format!(
                            "item task failed to complete: {error}"
                        )),
                    })
                }
            }
        }
        Ok(items)
    }
}

async fn run_statements(session: &dyn BackendSession, statements: &[String]) -> Result<()> {
    for statement in statements {
        session
            .execute_non_query(&CommandSpec::bare(statement))
            .await?;
    }
    Ok(())
}
