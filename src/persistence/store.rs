//! REST shot store.
//!
//! Shots are appended with `POST <base_url>.json` and listed with
//! `GET <base_url>.json`. Requests run as tokio tasks on the runtime handle
//! the store was built with; callers get the task's `JoinHandle` back and may
//! await or abort it. There is no retry and no ordering between requests.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::report::ShotResult;

use super::ShotSink;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("shot store base URL is not configured")]
    NotConfigured,
    #[error("shot store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("shot store returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Thin reqwest client for the shot collection.
#[derive(Clone)]
pub struct ShotStore {
    http: Client,
    base_url: String,
    runtime: Handle,
}

impl ShotStore {
    /// Build a store that spawns its requests on `runtime`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        runtime: Handle,
    ) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http, runtime))
    }

    /// Build a store around an already configured client.
    pub fn with_client(base_url: impl Into<String>, http: Client, runtime: Handle) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            runtime,
        }
    }

    /// Collection URL, or `None` when no base URL is configured.
    pub fn shots_url(&self) -> Option<String> {
        if self.base_url.trim().is_empty() {
            None
        } else {
            Some(format!("{}.json", self.base_url))
        }
    }

    /// Submit a shot in the background.
    ///
    /// Returns `None` without touching the network when the base URL is empty.
    /// The task resolves to the response body on success.
    pub fn save_shot(&self, shot: ShotResult) -> Option<JoinHandle<Result<String, StoreError>>> {
        let Some(url) = self.shots_url() else {
            error!("{}; shot not saved", StoreError::NotConfigured);
            return None;
        };

        let http = self.http.clone();
        Some(self.runtime.spawn(async move {
            let result = post_shot(&http, &url, &shot).await;
            match &result {
                Ok(body) => info!(%url, %body, "shot saved"),
                Err(err) => error!(%url, error = %err, "failed to save shot"),
            }
            result
        }))
    }

    /// Fetch every stored shot in the background.
    ///
    /// `callback` receives the raw JSON body, or `None` when the request
    /// fails. With an empty base URL no request is made, the callback gets
    /// `None` immediately and `None` is returned.
    pub fn get_shots<F>(&self, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        let Some(url) = self.shots_url() else {
            error!("{}; shots not fetched", StoreError::NotConfigured);
            callback(None);
            return None;
        };

        let http = self.http.clone();
        Some(self.runtime.spawn(async move {
            match fetch_shots(&http, &url).await {
                Ok(body) => {
                    info!(%url, bytes = body.len(), "shots received");
                    callback(Some(body));
                }
                Err(err) => {
                    error!(%url, error = %err, "failed to fetch shots");
                    callback(None);
                }
            }
        }))
    }
}

impl ShotSink for ShotStore {
    fn submit(&self, shot: ShotResult) {
        if self.save_shot(shot).is_none() {
            warn!("shot dropped");
        }
    }
}

async fn post_shot(http: &Client, url: &str, shot: &ShotResult) -> Result<String, StoreError> {
    let res = http.post(url).json(shot).send().await?;
    read_body(res).await
}

async fn fetch_shots(http: &Client, url: &str) -> Result<String, StoreError> {
    let res = http.get(url).send().await?;
    read_body(res).await
}

// Keep upstream status and body so callers can see why the store refused.
async fn read_body(res: reqwest::Response) -> Result<String, StoreError> {
    let status = res.status();
    let body = res.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(StoreError::Status { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn store(base_url: &str) -> ShotStore {
        let http = Client::builder()
            .timeout(Duration::from_secs(2))
            .no_proxy()
            .build()
            .unwrap();
        ShotStore::with_client(base_url, http, Handle::current())
    }

    /// Serve a single HTTP request, returning the raw request text.
    async fn serve_once(listener: TcpListener, status_line: &str, body: &str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            assert!(n > 0, "connection closed before headers");
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before body");
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).into_owned()
    }

    #[tokio::test]
    async fn test_empty_base_url_makes_no_request() {
        let store = store("");
        assert!(store.shots_url().is_none());
        assert!(store.save_shot(ShotResult::default()).is_none());

        let (tx, rx) = oneshot::channel();
        let handle = store.get_shots(move |body| {
            let _ = tx.send(body);
        });
        assert!(handle.is_none());
        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shots_url_appends_json() {
        let store = store("https://example.invalid/shots");
        assert_eq!(
            store.shots_url().as_deref(),
            Some("https://example.invalid/shots.json")
        );
    }

    #[tokio::test]
    async fn test_save_shot_posts_json() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "200 OK", r#"{"name":"-Nabc"}"#));

        let store = store(&format!("http://{addr}/shots"));
        let shot = ShotResult::new(45.0, 10.0, 1.0, true, 3.5, 2);
        let body = store.save_shot(shot).unwrap().await.unwrap().unwrap();
        assert_eq!(body, r#"{"name":"-Nabc"}"#);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /shots.json HTTP/1.1"));
        let payload = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let sent: ShotResult = serde_json::from_str(payload).unwrap();
        assert_eq!(sent, shot);
    }

    #[tokio::test]
    async fn test_get_shots_delivers_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stored = r#"{"-Nabc":{"angle":45.0,"force":10.0,"mass":1.0,"hit":true,"affected":2}}"#;
        let server = tokio::spawn(serve_once(listener, "200 OK", stored));

        let (tx, rx) = oneshot::channel();
        let store = store(&format!("http://{addr}/shots"));
        store
            .get_shots(move |body| {
                let _ = tx.send(body);
            })
            .unwrap()
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap().as_deref(), Some(stored));
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /shots.json HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            "401 Unauthorized",
            r#"{"error":"denied"}"#,
        ));

        let store = store(&format!("http://{addr}/shots"));
        let result = store.save_shot(ShotResult::default()).unwrap().await.unwrap();
        match result {
            Err(StoreError::Status { status, body }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("denied"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_shots_http_error_yields_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            "404 Not Found",
            r#"{"error":"not found"}"#,
        ));

        let (tx, rx) = oneshot::channel();
        let store = store(&format!("http://{addr}/shots"));
        store
            .get_shots(move |body| {
                let _ = tx.send(body);
            })
            .unwrap()
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), None);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /shots.json HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let store = store(&format!("http://{addr}/shots"));

        let (tx, rx) = oneshot::channel();
        store
            .get_shots(move |body| {
                let _ = tx.send(body);
            })
            .unwrap()
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), None);

        let saved = store.save_shot(ShotResult::default()).unwrap().await.unwrap();
        assert!(matches!(saved, Err(StoreError::Transport(_))));
    }
}
