//! Outcome classification.
//!
//! Pure mapping from how a checker operation terminated to a [`ResultCode`].
//! Three failure classes are kept apart because they mean different things to
//! operators: the service is unreachable (`DOWN`), the service is reachable but
//! broken (`MUMBLE`), or the checker itself is broken (`INTERNAL_ERROR`).

use std::io::ErrorKind;

use super::{CheckResult, CheckerError};
use crate::task::ResultCode;

/// Classify a finished checker operation.
pub fn classify(outcome: &CheckResult) -> ResultCode {
    match outcome {
        Ok(()) => ResultCode::Ok,
        Err(e) => classify_failure(e),
    }
}

/// Classify a checker failure. Total: every error maps to exactly one code.
pub fn classify_failure(error: &CheckerError) -> ResultCode {
    match error {
        CheckerError::Mumble(_) => ResultCode::Mumble,
        CheckerError::Offline(_) => ResultCode::Down,
        CheckerError::Http(e) => classify_http(e),
        CheckerError::Io(e) => classify_io(e.kind()),
        CheckerError::Internal(_) => ResultCode::InternalError,
    }
}

fn classify_http(error: &reqwest::Error) -> ResultCode {
    // Connection problems, redirect loops and non-success statuses from the
    // service count as unreachable.
    if error.is_connect()
        || error.is_timeout()
        || error.is_request()
        || error.is_status()
        || error.is_redirect()
    {
        return ResultCode::Down;
    }
    // A connection dropped while reading the body surfaces as a body/decode
    // error wrapping the socket error somewhere down the source chain.
    if let Some(io) = io_cause(error) {
        return classify_io(io.kind());
    }
    if error.is_body() || error.is_decode() {
        // The service answered with a body that cannot be read as sent.
        ResultCode::Mumble
    } else {
        ResultCode::InternalError
    }
}

fn io_cause<'a>(error: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = cause.source();
    }
    None
}

fn classify_io(kind: ErrorKind) -> ResultCode {
    match kind {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::BrokenPipe
        | ErrorKind::TimedOut
        | ErrorKind::UnexpectedEof
        | ErrorKind::AddrNotAvailable => ResultCode::Down,
        _ => ResultCode::InternalError,
    }
}

/// Render an error together with its chain of causes for the log stream.
pub fn failure_trace(error: &CheckerError) -> String {
    if let CheckerError::Internal(inner) = error {
        // anyhow's debug format includes the cause chain and, when captured,
        // the backtrace.
        return format!("{:?}", inner);
    }

    let mut trace = error.to_string();
    let mut source = std::error::Error::source(error);
    let mut depth = 0;
    while let Some(cause) = source {
        if depth == 0 {
            trace.push_str("\n\nCaused by:");
        }
        trace.push_str(&format!("\n    {}: {}", depth, cause));
        depth += 1;
        source = cause.source();
    }
    trace
}
