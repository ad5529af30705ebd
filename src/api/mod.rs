//! HTTP API for the checker harness.
//!
//! ## Endpoints
//!
//! - `GET /` - Greeting page naming the checker
//! - `POST /` - Run one checker task, answers `{"result": "<code>"}`

mod routes;

pub use routes::{router, serve, AppState};
