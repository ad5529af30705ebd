//! Result codes reported back to the scheduler.

use serde::{Deserialize, Serialize};

/// Outcome of one checker task.
///
/// This is the complete wire vocabulary; nothing else is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    /// The service behaved correctly
    Ok,
    /// The service was reachable but misbehaved
    Mumble,
    /// The service could not be reached
    Down,
    /// The checker itself failed
    InternalError,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::Mumble => "MUMBLE",
            ResultCode::Down => "DOWN",
            ResultCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of `POST /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerResult {
    pub result: ResultCode,
}

impl From<ResultCode> for CheckerResult {
    fn from(result: ResultCode) -> Self {
        Self { result }
    }
}
