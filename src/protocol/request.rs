//! Request envelope and item types.

use crate::backend::Parameter;
use serde::{Deserialize, Serialize};

/// How an item's result should be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// No result payload; the statement is executed for its effect.
    #[default]
    None,

    /// A single scalar value.
    Scalar,

    /// An ordered set of rows.
    RowSet,
}

/// A batch of named, parameterized data operations.
///
/// Item order is semantically meaningful: the response's items correspond to
/// these by index. An empty item list is a valid envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Opaque correlation id, echoed back verbatim and never interpreted.
    #[serde(default)]
    pub message_id: String,

    /// Run all items inside a single all-or-nothing transaction.
    #[serde(default)]
    pub transactional: bool,

    /// Fan items out across workers (output order is still request order).
    #[serde(default)]
    pub parallel: bool,

    /// The operations to execute, in order.
    #[serde(default)]
    pub items: Vec<RequestItem>,

    /// Raw non-query statements run once before any item.
    #[serde(default)]
    pub pre_queries: Vec<String>,

    /// Raw non-query statements run once after all items.
    #[serde(default)]
    pub post_queries: Vec<String>,
}

impl RequestEnvelope {
    /// Creates an empty envelope with the given correlation id.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ..Self::default()
        }
    }

    /// Marks the envelope transactional.
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Marks the envelope for ordered-parallel execution.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Appends an item to the envelope.
    pub fn with_item(mut self, item: RequestItem) -> Self {
        self.items.push(item);
        self
    }

    /// Appends a message-level pre-query.
    pub fn with_pre_query(mut self, statement: impl Into<String>) -> Self {
        self.pre_queries.push(statement.into());
        self
    }

    /// Appends a message-level post-query.
    pub fn with_post_query(mut self, statement: impl Into<String>) -> Self {
        self.post_queries.push(statement.into());
        self
    }
}

/// One named, parameterized operation within an envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestItem {
    /// Caller-supplied correlation key. Uniqueness is the caller's business.
    #[serde(default)]
    pub id: String,

    /// Method key used to resolve query text and, in registry mode, a command.
    pub method: String,

    /// Ordered parameter bindings.
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Requested result shape.
    #[serde(default)]
    pub response_format: ResponseFormat,

    /// Zero-based first row of the paging window (row-set items only).
    #[serde(default)]
    pub first_result: Option<u64>,

    /// Maximum number of rows in the paging window (row-set items only).
    #[serde(default)]
    pub max_results: Option<u64>,

    /// Item-scoped raw statements run before the item's own statement.
    #[serde(default)]
    pub pre_queries: Vec<String>,

    /// Item-scoped raw statements run after the item's own statement.
    #[serde(default)]
    pub post_queries: Vec<String>,
}

impl RequestItem {
    /// Creates an item with the given correlation id and method key.
    pub fn new(id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// Appends a parameter binding.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the requested result shape.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Sets the paging window.
    pub fn with_window(mut self, first_result: u64, max_results: u64) -> Self {
        self.first_result = Some(first_result);
        self.max_results = Some(max_results);
        self
    }

    /// Appends an item-scoped pre-query.
    pub fn with_pre_query(mut self, statement: impl Into<String>) -> Self {
        self.pre_queries.push(statement.into());
        self
    }

    /// Appends an item-scoped post-query.
    pub fn with_post_query(mut self, statement: impl Into<String>) -> Self {
        self.post_queries.push(statement.into());
        self
    }
}
