//! Log sinks: where task records end up.

use std::io::Write;
use std::sync::Mutex;

use super::{LogRecord, Severity};

/// Consumer of structured task records.
///
/// Implementations must be safe to call from many tasks at once and must write
/// each record as a unit.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Writes one JSON document per line.
pub struct JsonLinesSink<W: Write + Send = std::io::Stdout> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> LogSink for JsonLinesSink<W> {
    fn emit(&self, record: &LogRecord) {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize task log record: {}", e);
                return;
            }
        };
        line.push(b'\n');
        // Serialize outside the lock; hold it only for one write.
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writer.write_all(&line).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to write task log record: {}", e);
        }
    }
}

/// Forwards records to the process-wide `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! forward {
    ($level:ident, $record:expr) => {
        tracing::$level!(
            target: "checker_task",
            tool = %$record.tool,
            function = %$record.function,
            run_id = $record.run_id,
            round = $record.round,
            team = %$record.team_name,
            service = %$record.service_name,
            flag = ?$record.flag,
            flag_index = ?$record.flag_index,
            timestamp = %$record.timestamp,
            "{}",
            $record.message
        )
    };
}

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        match record.severity {
            Severity::Debug => forward!(debug, record),
            Severity::Info => forward!(info, record),
            Severity::Warning => forward!(warn, record),
            Severity::Error | Severity::Critical => forward!(error, record),
        }
    }
}

/// Keeps every record in memory. Meant for tests of checkers and the harness.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records emitted so far, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Records belonging to one run, in emission order.
    pub fn records_for_run(&self, run_id: i64) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.run_id == run_id)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }
}
