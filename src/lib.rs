//! Courier - a batch data-operation execution engine.
//!
//! Turns a request envelope of named, parameterized operations into an
//! index-aligned response envelope, with optional all-or-nothing transactions
//! and ordered-parallel fan-out. Backends plug in through the
//! [`backend::BackendRepository`] trait; query text comes from a
//! [`catalog::QueryCatalog`].

pub mod backend;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod executor;
pub mod logging;
pub mod protocol;

pub use config::EngineOptions;
pub use engine::BatchEngine;
pub use error::{CourierError, Result};
pub use protocol::{RequestEnvelope, RequestItem, ResponseEnvelope, ResponseItem};
