//! Image byte retrieval through a capability boundary.
//!
//! The binder never talks to the network directly: it asks an
//! [`ImageFetcher`] for bytes and builds the fill from whatever comes
//! back. Two implementations ship here:
//!
//! - [`HttpImageFetcher`]: a plain reqwest client with a request timeout,
//!   for contexts that can reach the network themselves.
//! - [`BridgeFetcher`]: a message-passing bridge for sandboxed contexts.
//!   Requests and responses are correlated by a generated id, so multiple
//!   in-flight fetches never cross-resolve, and an unanswered request
//!   times out instead of waiting forever.
//!
//! Known cloud-drive share links are rewritten to their direct-download
//! form before fetching.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::SheetSyncError;

/// Default deadline for one fetch round trip.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

static DRIVE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/([^/]+)").expect("valid drive path pattern"));

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Pull a Google Drive file id out of a share URL: the `/file/d/<id>/view`
/// path shape, an `id` query parameter on a drive host, or an existing
/// `export=download` link.
pub fn extract_drive_file_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.contains("drive.google.com") {
        if let Some(caps) = DRIVE_FILE_RE.captures(parsed.path()) {
            return Some(caps[1].to_string());
        }
        if let Some(id) = query_param(&parsed, "id") {
            return Some(id);
        }
    }
    if query_param(&parsed, "export").as_deref() == Some("download")
        && let Some(id) = query_param(&parsed, "id")
    {
        return Some(id);
    }
    None
}

/// Rewrite known cloud-drive "view" links into direct-download form;
/// anything else passes through untouched.
pub fn normalize_image_url(url: &str) -> String {
    match extract_drive_file_id(url) {
        Some(id) => format!("https://drive.google.com/uc?export=download&id={id}"),
        None => url.to_string(),
    }
}

/// Capability boundary for image byte retrieval.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Retrieve the raw bytes behind a URL. The URL is already normalized
    /// by the caller. Implementations must not wait unboundedly.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SheetSyncError>;
}

/// Direct HTTP fetcher backed by reqwest.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, SheetSyncError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SheetSyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sheetsync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SheetSyncError::Fetch(format!("HTTP client error: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SheetSyncError> {
        debug!(%url, "fetching image bytes");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SheetSyncError::Fetch(format!("failed to download {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(SheetSyncError::Fetch(format!(
                "failed to download {url}: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SheetSyncError::Fetch(format!("failed to read image data: {e}")))?;
        Ok(bytes.to_vec())
    }
}

// ----------------------------------------------------------------------
// Message-passing bridge
// ----------------------------------------------------------------------

/// Wire messages exchanged with an external byte-fetch collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BridgeMessage {
    #[serde(rename = "image-fetch")]
    Request(FetchRequest),
    #[serde(rename = "image-fetch-result")]
    Response(FetchResponse),
}

/// Outbound request: fetch `url`, answer with the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub id: String,
    pub url: String,
}

/// Inbound response, correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<FetchResponse>>>>;

/// Fetcher that forwards requests to an external collaborator over a
/// channel and awaits the correlated response.
pub struct BridgeFetcher {
    outbox: mpsc::UnboundedSender<FetchRequest>,
    pending: Pending,
    timeout: Duration,
}

impl BridgeFetcher {
    pub fn new(outbox: mpsc::UnboundedSender<FetchRequest>, timeout: Duration) -> Self {
        Self {
            outbox,
            pending: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    /// Route a response from the collaborator to its waiting request.
    /// Responses with no in-flight request (late arrivals after a timeout)
    /// are dropped with a warning.
    pub fn complete(&self, response: FetchResponse) {
        let waiter = self
            .pending
            .lock()
            .expect("pending map poisoned")
            .remove(&response.id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => warn!(id = %response.id, "dropping uncorrelated fetch response"),
        }
    }
}

#[async_trait]
impl ImageFetcher for BridgeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SheetSyncError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id.clone(), tx);
        self.outbox
            .send(FetchRequest {
                id: id.clone(),
                url: url.to_string(),
            })
            .map_err(|_| SheetSyncError::Fetch("fetch bridge is closed".into()))?;

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(SheetSyncError::Fetch("fetch bridge dropped request".into())),
            Err(_) => {
                self.pending
                    .lock()
                    .expect("pending map poisoned")
                    .remove(&id);
                return Err(SheetSyncError::Fetch(format!("fetch timed out for {url}")));
            }
        };
        if response.ok
            && let Some(bytes) = response.bytes
        {
            Ok(bytes)
        } else {
            Err(SheetSyncError::Fetch(
                response.error.unwrap_or_else(|| "fetch failed".into()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drive_view_link_rewrites_to_download() {
        assert_eq!(
            normalize_image_url("https://drive.google.com/file/d/abc123/view?usp=sharing"),
            "https://drive.google.com/uc?export=download&id=abc123"
        );
        assert_eq!(
            normalize_image_url("https://drive.google.com/open?id=xyz789"),
            "https://drive.google.com/uc?export=download&id=xyz789"
        );
    }

    #[test]
    fn download_form_is_stable_under_normalization() {
        let url = "https://drive.google.com/uc?export=download&id=abc123";
        assert_eq!(normalize_image_url(url), url);
    }

    #[test]
    fn other_urls_pass_through() {
        assert_eq!(
            normalize_image_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(normalize_image_url("not a url"), "not a url");
    }

    #[test]
    fn bridge_messages_use_the_wire_contract() {
        let msg = BridgeMessage::Request(FetchRequest {
            id: "r1".into(),
            url: "https://example.com/a.png".into(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "image-fetch");
        assert_eq!(json["id"], "r1");

        let back: BridgeMessage = serde_json::from_value(serde_json::json!({
            "kind": "image-fetch-result",
            "id": "r1",
            "ok": false,
            "error": "404",
        }))
        .unwrap();
        match back {
            BridgeMessage::Response(r) => {
                assert!(!r.ok);
                assert_eq!(r.error.as_deref(), Some("404"));
            }
            _ => panic!("expected response"),
        }
    }

    #[tokio::test]
    async fn bridge_correlates_out_of_order_responses() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = Arc::new(BridgeFetcher::new(tx, Duration::from_secs(5)));

        let f1 = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch("https://example.com/one").await }
        });
        let f2 = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch("https://example.com/two").await }
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let (one, two) = if first.url.ends_with("one") {
            (first, second)
        } else {
            (second, first)
        };

        // Answer in reverse order; each caller still gets its own bytes.
        fetcher.complete(FetchResponse {
            id: two.id,
            ok: true,
            bytes: Some(b"TWO".to_vec()),
            error: None,
        });
        fetcher.complete(FetchResponse {
            id: one.id,
            ok: true,
            bytes: Some(b"ONE".to_vec()),
            error: None,
        });

        assert_eq!(f1.await.unwrap().unwrap(), b"ONE".to_vec());
        assert_eq!(f2.await.unwrap().unwrap(), b"TWO".to_vec());
    }

    #[tokio::test]
    async fn bridge_times_out_without_a_response() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let fetcher = BridgeFetcher::new(tx, Duration::from_millis(20));
        let err = fetcher.fetch("https://example.com/slow").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn bridge_surfaces_collaborator_errors() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = Arc::new(BridgeFetcher::new(tx, Duration::from_secs(5)));
        let call = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch("https://example.com/missing").await }
        });
        let req = rx.recv().await.unwrap();
        fetcher.complete(FetchResponse {
            id: req.id,
            ok: false,
            bytes: None,
            error: Some("HTTP 404".into()),
        });
        let err = call.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
