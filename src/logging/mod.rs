//! Per-task structured logging.
//!
//! Every line a checker writes while handling a task becomes one
//! [`LogRecord`]: static checker identity, the task's [`LogContext`], and the
//! per-call severity, function label, message and timestamp. Records are handed
//! to a [`LogSink`] one at a time, in call order.
//!
//! The logger a checker receives ([`TaskLogger`]) owns its task's context. There
//! is no global mutable logger state, so two tasks running concurrently can
//! never write into each other's records.

mod context;
mod sink;

pub use context::{format_timestamp, LogContext, LogRecord, Severity, TaskLogger};
pub use sink::{JsonLinesSink, LogSink, MemorySink, TracingSink};
