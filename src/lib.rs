//! # Checker harness
//!
//! Task-dispatch harness for attack/defense service checkers.
//!
//! This library provides:
//! - An HTTP API the game scheduler submits checker tasks to
//! - A dispatcher routing each task to a checker operation and classifying
//!   the outcome as `OK`, `MUMBLE`, `DOWN` or `INTERNAL_ERROR`
//! - Per-task structured logging
//!
//! ## Task Flow
//! ```text
//!   POST / ──▶ TaskRecord ──▶ Dispatcher ──▶ CheckerCapability::{putflag, ...}
//!                                 │                     │
//!                                 │   TaskLogger ◀──────┘
//!                                 ▼
//!                         classify(outcome) ──▶ {"result": "<code>"}
//! ```
//!
//! ## Modules
//! - `task`: Task records and result codes
//! - `checker`: The checker capability trait, errors and classification
//! - `dispatch`: Routing and outcome logging
//! - `logging`: Log context, records and sinks
//! - `api`: HTTP routes
//! - `kvstore`: Reference checker used by the bundled binary

pub mod api;
pub mod checker;
pub mod config;
pub mod dispatch;
pub mod kvstore;
pub mod logging;
pub mod task;

pub use checker::{CheckResult, CheckerCapability, CheckerError, CheckerIdentity};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use logging::{LogSink, TaskLogger};
pub use task::{ResultCode, TaskMethod, TaskRecord};
