//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::checker::CheckerCapability;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::task::{CheckerResult, ResultCode, TaskRecord};

/// Shared application state.
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// Build the router around a dispatcher.
pub fn router(dispatcher: Dispatcher) -> Router {
    let state = Arc::new(AppState { dispatcher });

    Router::new()
        .route("/", get(greeting).post(submit_task))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server for the given checker.
pub async fn serve(config: Config, checker: Arc<dyn CheckerCapability>) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(checker, config.log_sink.build());
    let app = router(dispatcher);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Greeting page.
async fn greeting(State(state): State<Arc<AppState>>) -> Html<String> {
    tracing::info!("GET /");
    Html(format!(
        "<h1>Welcome to {}</h1>",
        state.dispatcher.identity().name()
    ))
}

/// Run one task. Always answers 200; the outcome is carried in the body only.
async fn submit_task(State(state): State<Arc<AppState>>, body: Bytes) -> Json<CheckerResult> {
    let task: TaskRecord = match serde_json::from_slice(&body) {
        Ok(task) => task,
        Err(e) => {
            tracing::error!("Rejected malformed task body: {}", e);
            return Json(ResultCode::InternalError.into());
        }
    };

    let result = state.dispatcher.dispatch(&task).await;
    Json(result.into())
}
