//! Reference checker for a simple key/value HTTP service.
//!
//! The service stores text blobs under `/flags/{round}/{index}` and
//! `/noise/{round}/{index}` via `PUT` and returns them via `GET`. `GET /`
//! answers with any 2xx when the service is healthy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};

use crate::checker::{CheckResult, CheckerCapability, CheckerError, CheckerIdentity};
use crate::logging::TaskLogger;
use crate::task::TaskRecord;

/// Checker for the key/value service.
pub struct KvStoreChecker {
    identity: CheckerIdentity,
    client: reqwest::Client,
    service_port: u16,
}

impl KvStoreChecker {
    pub fn new(
        service_name: impl Into<String>,
        service_port: u16,
        timeout: Duration,
    ) -> Result<Self, CheckerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckerError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            identity: CheckerIdentity::new(service_name),
            client,
            service_port,
        })
    }

    fn base_url(&self, task: &TaskRecord) -> String {
        format!("http://{}:{}", task.address, self.service_port)
    }

    async fn store(&self, logger: &TaskLogger, url: String, value: String) -> CheckResult {
        logger.debug(format!("PUT {}", url));
        self.client
            .put(&url)
            .body(value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch(&self, logger: &TaskLogger, url: String, what: &str) -> Result<String, CheckerError> {
        logger.debug(format!("GET {}", url));
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CheckerError::mumble(format!("{} not found", what)));
        }
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}

/// Flag of a flag task. A flag task without a flag is a scheduler or checker bug.
fn require_flag(task: &TaskRecord) -> Result<&str, CheckerError> {
    task.flag
        .as_deref()
        .ok_or_else(|| CheckerError::internal(format!("{} task without flag", task.method)))
}

/// Noise value for a team and round. Deterministic so `getnoise` can recompute
/// what `putnoise` stored in the related round.
pub fn noise_for(team_id: &str, round: i64, index: i64) -> String {
    let digest = Sha256::digest(format!("{}:{}:{}", team_id, round, index).as_bytes());
    hex::encode(&digest[..16])
}

#[async_trait]
impl CheckerCapability for KvStoreChecker {
    fn identity(&self) -> &CheckerIdentity {
        &self.identity
    }

    async fn putflag(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let flag = require_flag(task)?;
        let index = task.flag_index.unwrap_or(0);
        let url = format!("{}/flags/{}/{}", self.base_url(task), task.round, index);
        self.store(logger, url, flag.to_string()).await?;
        logger.info("Flag stored");
        Ok(())
    }

    async fn getflag(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let flag = require_flag(task)?;
        let index = task.flag_index.unwrap_or(0);
        let url = format!(
            "{}/flags/{}/{}",
            self.base_url(task),
            task.related_round_id,
            index
        );
        let stored = self.fetch(logger, url, "flag").await?;
        if stored.trim() != flag {
            return Err(CheckerError::mumble("returned flag does not match"));
        }
        logger.info("Flag retrieved");
        Ok(())
    }

    async fn putnoise(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let index = task.flag_index.unwrap_or(0);
        let noise = noise_for(&task.team_id, task.round, index);
        let url = format!("{}/noise/{}/{}", self.base_url(task), task.round, index);
        self.store(logger, url, noise).await
    }

    async fn getnoise(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let index = task.flag_index.unwrap_or(0);
        let expected = noise_for(&task.team_id, task.related_round_id, index);
        let url = format!(
            "{}/noise/{}/{}",
            self.base_url(task),
            task.related_round_id,
            index
        );
        let stored = self.fetch(logger, url, "noise").await?;
        if stored.trim() != expected {
            return Err(CheckerError::mumble("returned noise does not match"));
        }
        Ok(())
    }

    async fn havoc(&self, logger: &TaskLogger, task: &TaskRecord) -> CheckResult {
        let url = format!("{}/", self.base_url(task));
        logger.debug(format!("GET {}", url));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CheckerError::mumble(format!(
                "index answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::classify;
    use crate::logging::{LogContext, MemorySink};
    use crate::task::{ResultCode, TaskMethod};
    use axum::extract::{Path, State};
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Store = Arc<Mutex<HashMap<String, String>>>;

    /// In-process stand-in for the key/value service. `corrupt` makes every read
    /// return garbage.
    async fn spawn_service(corrupt: bool) -> u16 {
        let store: Store = Arc::default();
        let app = Router::new()
            .route("/", get(|| async { "kv" }))
            .route(
                "/:kind/:round/:index",
                get(
                    move |State(store): State<Store>, Path((kind, round, index)): Path<(String, i64, i64)>| async move {
                        let key = format!("{}/{}/{}", kind, round, index);
                        let value = store.lock().unwrap().get(&key).cloned();
                        match value {
                            Some(_) if corrupt => Ok("garbage".to_string()),
                            Some(v) => Ok(v),
                            None => Err(HttpStatus::NOT_FOUND),
                        }
                    },
                )
                .put(
                    |State(store): State<Store>, Path((kind, round, index)): Path<(String, i64, i64)>, body: String| async move {
                        store
                            .lock()
                            .unwrap()
                            .insert(format!("{}/{}/{}", kind, round, index), body);
                        HttpStatus::CREATED
                    },
                ),
            )
            .with_state(store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    fn task(method: TaskMethod, round: i64, related: i64) -> TaskRecord {
        TaskRecord {
            run_id: 1,
            method,
            address: "127.0.0.1".to_string(),
            service_id: "1".to_string(),
            service_name: "kvstore".to_string(),
            team_id: "3".to_string(),
            team: "teamA".to_string(),
            related_round_id: related,
            round,
            flag: Some("FLAG_X".to_string()),
            flag_index: Some(0),
        }
    }

    fn checker(port: u16) -> KvStoreChecker {
        KvStoreChecker::new("kvstore", port, Duration::from_secs(5)).unwrap()
    }

    fn logger(checker: &KvStoreChecker, task: &TaskRecord) -> TaskLogger {
        TaskLogger::new(
            Arc::new(LogContext::new(checker.identity(), task)),
            Arc::new(MemorySink::new()),
        )
    }

    #[tokio::test]
    async fn test_flag_roundtrip() {
        let port = spawn_service(false).await;
        let checker = checker(port);

        let put = task(TaskMethod::PutFlag, 5, 5);
        checker.putflag(&logger(&checker, &put), &put).await.unwrap();

        let get = task(TaskMethod::GetFlag, 6, 5);
        checker.getflag(&logger(&checker, &get), &get).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_flag_is_mumble() {
        let port = spawn_service(false).await;
        let checker = checker(port);
        let get = task(TaskMethod::GetFlag, 6, 2);
        let outcome = checker.getflag(&logger(&checker, &get), &get).await;
        assert_eq!(classify(&outcome), ResultCode::Mumble);
    }

    #[tokio::test]
    async fn test_corrupted_noise_is_mumble() {
        let port = spawn_service(true).await;
        let checker = checker(port);

        let put = task(TaskMethod::PutNoise, 5, 5);
        checker.putnoise(&logger(&checker, &put), &put).await.unwrap();

        let get = task(TaskMethod::GetNoise, 6, 5);
        let outcome = checker.getnoise(&logger(&checker, &get), &get).await;
        assert_eq!(classify(&outcome), ResultCode::Mumble);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_down() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let checker = checker(port);
        let havoc = task(TaskMethod::Havoc, 5, 5);
        let outcome = checker.havoc(&logger(&checker, &havoc), &havoc).await;
        assert_eq!(classify(&outcome), ResultCode::Down);
    }

    #[tokio::test]
    async fn test_flag_task_without_flag_is_internal() {
        let checker = checker(1);
        let mut put = task(TaskMethod::PutFlag, 5, 5);
        put.flag = None;
        let outcome = checker.putflag(&logger(&checker, &put), &put).await;
        assert_eq!(classify(&outcome), ResultCode::InternalError);
    }

    #[tokio::test]
    async fn test_noise_is_keyed_by_round_and_flag_index() {
        let port = spawn_service(false).await;
        let checker = checker(port);

        let mut put = task(TaskMethod::PutNoise, 5, 5);
        put.flag_index = Some(2);
        checker.putnoise(&logger(&checker, &put), &put).await.unwrap();

        let stored = reqwest::get(format!("http://127.0.0.1:{}/noise/5/2", port))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(stored, noise_for("3", 5, 2));
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_body_is_down() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nFLAG")
                .await;
            let _ = socket.shutdown().await;
        });

        let checker = checker(port);
        let get = task(TaskMethod::GetFlag, 6, 5);
        let outcome = checker.getflag(&logger(&checker, &get), &get).await;
        assert_eq!(classify(&outcome), ResultCode::Down);
    }

    #[test]
    fn test_noise_is_deterministic() {
        assert_eq!(noise_for("3", 5, 0), noise_for("3", 5, 0));
        assert_ne!(noise_for("3", 5, 0), noise_for("3", 6, 0));
        assert_eq!(noise_for("3", 5, 0).len(), 32);
    }
}
