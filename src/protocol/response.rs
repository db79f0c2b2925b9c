//! Response envelope, item and error types.

use super::request::RequestItem;
use crate::backend::{RowSet, Value};
use crate::error::CourierError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A typed, serializable failure outcome.
///
/// Item-level errors live on the item that failed; message-level errors live
/// on the envelope and mean per-item processing was cut short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorOutcome {
    /// Short machine-readable code.
    pub code: String,

    /// Human-readable message.
    pub message: String,

    /// Original error classification, if known.
    pub category: Option<String>,
}

impl ErrorOutcome {
    /// Creates an error outcome with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
        }
    }
}

impl From<&CourierError> for ErrorOutcome {
    fn from(err: &CourierError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            category: Some(err.category().to_string()),
        }
    }
}

impl From<CourierError> for ErrorOutcome {
    fn from(err: CourierError) -> Self {
        Self::from(&err)
    }
}

/// The ordered result of a batch, one item per request item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation id copied from the request (empty if the request was
    /// absent).
    pub message_id: String,

    /// Per-item results, index-aligned with the request's items.
    pub items: Vec<ResponseItem>,

    /// Message-level errors: populated only for failures that prevented
    /// per-item processing.
    pub errors: Vec<ErrorOutcome>,
}

impl ResponseEnvelope {
    /// Creates an empty response carrying the given correlation id.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// The response for an absent request: no items, one protocol error.
    pub fn no_request() -> Self {
        let mut response = Self::default();
        response
            .errors
            .push(ErrorOutcome::from(CourierError::protocol(
                "no request provided",
            )));
        response
    }

    /// Returns true if the envelope carries no message-level errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The result of one request item.
///
/// Built from its request item before anything executes, so even an item
/// whose query text never resolved comes back as a valid, inert slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseItem {
    /// Correlation key copied from the request item.
    pub id: String,

    /// Method key copied from the request item.
    pub method: String,

    /// Snapshot of the resolved query text (empty if resolution missed).
    pub query: String,

    /// Scalar or non-query outcome, when the item produced one.
    pub result_value: Option<Value>,

    /// Row-set outcome, when the item produced one.
    pub row_set: Option<RowSet>,

    /// Item-scoped errors; normally zero or one entries.
    pub errors: Vec<ErrorOutcome>,

    /// Wall-clock duration of this item's processing, including its pre/post
    /// hooks. Set on every path, success or failure.
    #[serde(with = "duration_serde")]
    pub execution_time: Duration,
}

impl ResponseItem {
    /// Builds an inert response slot from a request item.
    ///
    /// Never fails and never executes anything.
    pub fn from_request(item: &RequestItem, query: impl Into<String>) -> Self {
        Self {
            id: item.id.clone(),
            method: item.method.clone(),
            query: query.into(),
            result_value: None,
            row_set: None,
            errors: Vec::new(),
            execution_time: Duration::ZERO,
        }
    }

    /// Returns true if the item completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Serde support for Duration (not natively supported by serde).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Deserializing straight into u64 makes oversized inputs an error
        // instead of a silent truncation.
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
