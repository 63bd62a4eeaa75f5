//! Instrumented cache facade
//!
//! [`Cache`] stores values under generated keys, counts every `store` call,
//! and (when the store supports it) records each call's input and output.
//! [`replay`] prints that history back.

mod facade;
pub mod instrument;
pub mod replay;

pub use facade::Cache;
pub use instrument::Operation;
pub use replay::{call_log, replay, BoundOperation, CallLog, RecordedCall};
