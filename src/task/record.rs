//! Inbound task description.
//!
//! # Invariants
//! - A `TaskRecord` is never mutated after deserialization.
//! - `method` is one of the five recognized methods, or `TaskMethod::Unknown`
//!   carrying the raw string so the dispatcher can classify it.

use serde::{Deserialize, Serialize};

/// The five task methods a checker understands.
///
/// Deserializes from the raw method string. Strings outside the recognized set
/// become `Unknown` instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskMethod {
    PutFlag,
    GetFlag,
    PutNoise,
    GetNoise,
    Havoc,
    /// Anything else the scheduler sent, kept verbatim for logging.
    Unknown(String),
}

impl TaskMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            TaskMethod::PutFlag => "putflag",
            TaskMethod::GetFlag => "getflag",
            TaskMethod::PutNoise => "putnoise",
            TaskMethod::GetNoise => "getnoise",
            TaskMethod::Havoc => "havoc",
            TaskMethod::Unknown(raw) => raw,
        }
    }

    /// Whether this method plants or retrieves a flag.
    pub fn is_flag_method(&self) -> bool {
        matches!(self, TaskMethod::PutFlag | TaskMethod::GetFlag)
    }
}

impl From<String> for TaskMethod {
    fn from(raw: String) -> Self {
        // Exact, case-sensitive match only.
        match raw.as_str() {
            "putflag" => TaskMethod::PutFlag,
            "getflag" => TaskMethod::GetFlag,
            "putnoise" => TaskMethod::PutNoise,
            "getnoise" => TaskMethod::GetNoise,
            "havoc" => TaskMethod::Havoc,
            _ => TaskMethod::Unknown(raw),
        }
    }
}

impl From<TaskMethod> for String {
    fn from(method: TaskMethod) -> Self {
        match method {
            TaskMethod::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checker task as submitted by the scheduler.
///
/// Field names follow the scheduler's camelCase wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub run_id: i64,
    pub method: TaskMethod,
    /// Address of the team's vulnbox running the service under test
    pub address: String,
    pub service_id: String,
    pub service_name: String,
    pub team_id: String,
    /// Team name
    pub team: String,
    /// Round in which the flag or noise was planted (for get* methods)
    pub related_round_id: i64,
    pub round: i64,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub flag_index: Option<i64>,
}
