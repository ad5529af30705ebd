//! Task module - the inbound checker task and its outcome vocabulary.
//!
//! A task is created once per `POST /`, handed to the dispatcher by shared
//! reference and dropped when the response is written.

mod record;
mod result;

pub use record::{TaskMethod, TaskRecord};
pub use result::{CheckerResult, ResultCode};
