//! Checker capability - the seam between the harness and checker logic.
//!
//! A concrete checker implements [`CheckerCapability`]: one async operation per
//! task method. The harness never looks at what an operation does, only at how
//! it terminates:
//! - `Ok(())` - the service behaved
//! - `Err(CheckerError::Mumble(..))` - the service answered, but wrongly
//! - `Err(CheckerError::Offline(..))` or a connection-level failure - the
//!   service could not be reached
//! - anything else - the checker itself is broken
//!
//! See [`classify`] for the exact mapping onto result codes.

mod classify;
mod error;

pub use classify::{classify, classify_failure, failure_trace};
pub use error::CheckerError;

use async_trait::async_trait;

use crate::logging::TaskLogger;
use crate::task::TaskRecord;

/// Result of a single checker operation.
pub type CheckResult = Result<(), CheckerError>;

/// Static identity of a checker.
///
/// # Invariants
/// - `name == service_name + "Checker"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerIdentity {
    service_name: String,
    name: String,
}

impl CheckerIdentity {
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        let name = format!("{}Checker", service_name);
        Self { service_name, name }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Checker name as it appears in the `tool` and `module` log fields.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Operations a checker provides, one per task method.
///
/// # Contract
/// - Each operation receives a logger bound to the current task; records
///   written through it carry that task's context.
/// - Operations must not panic. A panic is still caught by the dispatcher and
///   reported as `INTERNAL_ERROR`.
/// - Operations are called concurrently for different tasks and must not rely
///   on per-task state stored in `self`.
#[async_trait]
pub trait CheckerCapability: Send + Sync {
    /// Identity used for log records and the greeting page.
    fn identity(&self) -> &CheckerIdentity;

    /// Store `task.flag` in the service.
    async fn putflag(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult;

    /// Retrieve the flag planted in `task.related_round_id` and compare it.
    async fn getflag(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult;

    /// Store non-flag data to exercise the service.
    async fn putnoise(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult;

    /// Retrieve and verify previously stored noise.
    async fn getnoise(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult;

    /// Any additional functionality probe.
    async fn havoc(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult;
}
