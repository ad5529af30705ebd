//! Task dispatcher.
//!
//! # Flow
//! 1. Build the task's `LogContext` and a logger bound to it
//! 2. Log receipt
//! 3. Route the method to exactly one checker operation (or fail on an
//!    unknown method without touching the checker)
//! 4. Classify the outcome and log it
//!
//! # Invariants
//! - `dispatch()` always returns a `ResultCode`; no error or panic escapes.
//! - Exactly one receipt line and one outcome line are logged per task, both
//!   through the task's own logger.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use crate::checker::{
    classify, failure_trace, CheckResult, CheckerCapability, CheckerError, CheckerIdentity,
};
use crate::logging::{LogContext, LogSink, Severity, TaskLogger};
use crate::task::{ResultCode, TaskMethod, TaskRecord};

/// Routes tasks to a checker and turns the outcome into a result code.
///
/// Holds no per-task state; one instance serves all concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    checker: Arc<dyn CheckerCapability>,
    sink: Arc<dyn LogSink>,
}

impl Dispatcher {
    pub fn new(checker: Arc<dyn CheckerCapability>, sink: Arc<dyn LogSink>) -> Self {
        Self { checker, sink }
    }

    pub fn identity(&self) -> &CheckerIdentity {
        self.checker.identity()
    }

    /// Handle one task end to end.
    pub async fn dispatch(&self, task: &TaskRecord) -> ResultCode {
        let context = Arc::new(LogContext::new(self.checker.identity(), task));
        let logger = TaskLogger::new(context, Arc::clone(&self.sink));
        let span = tracing::info_span!(
            "task",
            run_id = task.run_id,
            method = %task.method,
            team_id = %task.team_id
        );

        async move {
            logger.info(format!("Received task ({})", summary(task)));

            let outcome = AssertUnwindSafe(self.invoke(&logger, task))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(panic_error(payload)));

            let code = classify(&outcome);
            match &outcome {
                Ok(()) => logger.info(format!("Task finished OK ({})", summary(task))),
                Err(e) => {
                    let severity = match code {
                        ResultCode::InternalError => Severity::Error,
                        _ => Severity::Warning,
                    };
                    logger.log(
                        severity,
                        format!("Task finished {}: {}", code, failure_trace(e)),
                    );
                }
            }
            code
        }
        .instrument(span)
        .await
    }

    async fn invoke(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let checker = &self.checker;
        match &task.method {
            TaskMethod::PutFlag => checker.putflag(&logger.in_function("putflag"), task).await,
            TaskMethod::GetFlag => checker.getflag(&logger.in_function("getflag"), task).await,
            TaskMethod::PutNoise => checker.putnoise(&logger.in_function("putnoise"), task).await,
            TaskMethod::GetNoise => checker.getnoise(&logger.in_function("getnoise"), task).await,
            TaskMethod::Havoc => checker.havoc(&logger.in_function("havoc"), task).await,
            TaskMethod::Unknown(raw) => Err(CheckerError::internal(format!(
                "Unknown rpc method {}",
                raw
            ))),
        }
    }
}

fn summary(task: &TaskRecord) -> String {
    let index = task
        .flag_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "id={}, teamid={}, method={}, index={}",
        task.run_id, task.team_id, task.method, index
    )
}

fn panic_error(payload: Box<dyn Any + Send>) -> CheckerError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    CheckerError::internal(format!("Checker panicked: {}", message))
}
