//! Log context, records and the task-scoped logger.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LogSink;
use crate::checker::CheckerIdentity;
use crate::task::TaskRecord;

/// Value of the `type` field on every task record.
const RECORD_TYPE: &str = "infrastructure";

/// Function label used for lines the harness itself writes.
const DISPATCH_FUNCTION: &str = "dispatch";

/// Severity of a log record, named like the collector expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Task metadata attached to every record of one task.
///
/// # Invariants
/// - Built from exactly one `TaskRecord`; fields are copied verbatim.
/// - Never shared between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Checker name (`{service}Checker`)
    pub checker_name: String,
    pub service_name: String,
    pub flag: Option<String>,
    pub flag_index: Option<i64>,
    pub run_id: i64,
    pub round: i64,
    pub team_name: String,
}

impl LogContext {
    pub fn new(identity: &CheckerIdentity, task: &TaskRecord) -> Self {
        Self {
            checker_name: identity.name().to_string(),
            service_name: identity.service_name().to_string(),
            flag: task.flag.clone(),
            flag_index: task.flag_index,
            run_id: task.run_id,
            round: task.round,
            team_name: task.team.clone(),
        }
    }

    /// Assemble a record for one log call, stamped with the current time.
    pub fn record(&self, severity: Severity, function: &str, message: String) -> LogRecord {
        self.record_at(Utc::now(), severity, function, message)
    }

    pub fn record_at(
        &self,
        at: DateTime<Utc>,
        severity: Severity,
        function: &str,
        message: String,
    ) -> LogRecord {
        LogRecord {
            tool: self.checker_name.clone(),
            kind: RECORD_TYPE.to_string(),
            severity,
            timestamp: format_timestamp(at),
            module: self.checker_name.clone(),
            function: function.to_string(),
            flag: self.flag.clone(),
            flag_index: self.flag_index,
            run_id: self.run_id,
            round: self.round,
            message,
            team_name: self.team_name.clone(),
            service_name: self.service_name.clone(),
        }
    }
}

/// One structured log line, as handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub tool: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub timestamp: String,
    pub module: String,
    pub function: String,
    pub flag: Option<String>,
    pub flag_index: Option<i64>,
    pub run_id: i64,
    pub round: i64,
    pub message: String,
    pub team_name: String,
    pub service_name: String,
}

/// Logger bound to a single task.
///
/// Cloning is cheap; clones share the same context and sink. Use
/// [`TaskLogger::in_function`] to relabel the `function` field.
#[derive(Clone)]
pub struct TaskLogger {
    context: Arc<LogContext>,
    sink: Arc<dyn LogSink>,
    function: Cow<'static, str>,
}

impl TaskLogger {
    pub fn new(context: Arc<LogContext>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            context,
            sink,
            function: Cow::Borrowed(DISPATCH_FUNCTION),
        }
    }

    /// A logger for the same task whose records carry a different function label.
    pub fn in_function(&self, function: impl Into<Cow<'static, str>>) -> Self {
        Self {
            context: Arc::clone(&self.context),
            sink: Arc::clone(&self.sink),
            function: function.into(),
        }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        let record = self.context.record(severity, &self.function, message.into());
        self.sink.emit(&record);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Severity::Critical, message);
    }
}

impl std::fmt::Debug for TaskLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskLogger")
            .field("context", &self.context)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::task::TaskMethod;
    use chrono::TimeZone;

    fn sample_task() -> TaskRecord {
        TaskRecord {
            run_id: 7,
            method: TaskMethod::PutFlag,
            address: "10.0.0.3".to_string(),
            service_id: "1".to_string(),
            service_name: "kvstore".to_string(),
            team_id: "3".to_string(),
            team: "teamA".to_string(),
            related_round_id: 4,
            round: 5,
            flag: Some("FLAG_X".to_string()),
            flag_index: Some(0),
        }
    }

    #[test]
    fn test_timestamp_has_microseconds() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap()
            + chrono::Duration::microseconds(42);
        assert_eq!(format_timestamp(at), "2024-03-09T07:05:02.000042Z");
    }

    #[test]
    fn test_record_copies_task_fields() {
        let identity = CheckerIdentity::new("kvstore");
        let context = LogContext::new(&identity, &sample_task());
        let record = context.record(Severity::Info, "putflag", "hello".to_string());

        assert_eq!(record.tool, "kvstoreChecker");
        assert_eq!(record.module, "kvstoreChecker");
        assert_eq!(record.kind, "infrastructure");
        assert_eq!(record.service_name, "kvstore");
        assert_eq!(record.flag.as_deref(), Some("FLAG_X"));
        assert_eq!(record.flag_index, Some(0));
        assert_eq!(record.run_id, 7);
        assert_eq!(record.round, 5);
        assert_eq!(record.team_name, "teamA");
        assert_eq!(record.function, "putflag");
    }

    #[test]
    fn test_record_json_field_names() {
        let identity = CheckerIdentity::new("kvstore");
        let context = LogContext::new(&identity, &sample_task());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = context.record_at(at, Severity::Warning, "havoc", "m".to_string());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "infrastructure");
        assert_eq!(json["severity"], "WARNING");
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00.000000Z");
        assert_eq!(json["flagIndex"], 0);
        assert_eq!(json["runId"], 7);
        assert_eq!(json["teamName"], "teamA");
        assert_eq!(json["serviceName"], "kvstore");
    }

    #[test]
    fn test_logger_emits_in_call_order() {
        let identity = CheckerIdentity::new("kvstore");
        let sink = Arc::new(MemorySink::new());
        let logger = TaskLogger::new(
            Arc::new(LogContext::new(&identity, &sample_task())),
            sink.clone(),
        );

        logger.info("first");
        logger.in_function("getflag").error("second");
        logger.debug("third");

        let records = sink.records();
        let messages: Vec<_> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(records[0].function, "dispatch");
        assert_eq!(records[1].function, "getflag");
        assert_eq!(records[1].severity, Severity::Error);
        assert_eq!(records[2].function, "dispatch");
    }
}
