//! Protocol model for batch requests and responses.
//!
//! Pure data: the envelope/item types carry no behavior beyond their
//! invariants, so a transport layer can build and consume them without
//! touching the engine.

mod request;
mod response;

pub use request::{RequestEnvelope, RequestItem, ResponseFormat};
pub use response::{ErrorOutcome, ResponseEnvelope, ResponseItem};
