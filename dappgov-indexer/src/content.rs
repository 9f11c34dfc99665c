//! Bridge to the external content-retrieval capability
//!
//! The indexer never interprets bundle contents. It hands the content id
//! recovered from a proposal to a [`ContentGateway`] and gets back metadata
//! or a bounded, sanitized text excerpt.

use async_trait::async_trait;
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::{ContentGateway, IndexerError, IndexerResult, NetworkError};
use crate::models::bundle::BundleReference;
use crate::models::content::{ContentEntry, ContentMode, ContentRequest, ContentResponse};

/// Hard cap on excerpt size regardless of what the caller asks for
pub const MAX_EXCERPT_BYTES: usize = 64 * 1024;

/// Keep printable text plus newlines and tabs, cut at `max_bytes` on a char boundary
pub fn sanitize_excerpt(raw: &[u8], max_bytes: usize) -> (String, bool) {
    let limit = max_bytes.min(MAX_EXCERPT_BYTES);
    let text = String::from_utf8_lossy(raw);
    let mut out = String::with_capacity(limit.min(text.len()));
    let mut truncated = raw.len() > limit;
    for ch in text.chars() {
        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }
        if out.len() + ch.len_utf8() > limit {
            truncated = true;
            break;
        }
        out.push(ch);
    }
    (out, truncated)
}

/// UnixFS directory as rendered by a gateway with `?format=dag-json`
#[derive(Debug, Deserialize)]
struct DagDirectory {
    #[serde(rename = "Links", default)]
    links: Vec<DagLink>,
}

#[derive(Debug, Deserialize)]
struct DagLink {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Tsize")]
    size: Option<u64>,
}

/// Path-style IPFS HTTP gateway (`<base>/ipfs/<cid>/<path>`)
pub struct HttpContentGateway {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpContentGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn url_for(&self, request: &ContentRequest) -> String {
        format!("{}/ipfs/{}", self.base_url, request.resource())
    }

    fn fetch_blocking(agent: ureq::Agent, url: String, mode: ContentMode) -> IndexerResult<ContentResponse> {
        match mode {
            ContentMode::Head => {
                let response = agent.head(&url).call().map_err(NetworkError::from)?;
                let size = response
                    .header("Content-Length")
                    .and_then(|v| v.parse::<u64>().ok());
                let content_type = response.header("Content-Type").map(str::to_string);
                Ok(ContentResponse::Head { size, content_type })
            }
            ContentMode::Excerpt { max_bytes } => {
                let limit = max_bytes.min(MAX_EXCERPT_BYTES);
                let response = agent.get(&url).call().map_err(NetworkError::from)?;
                let mut raw = Vec::with_capacity(limit);
                response
                    .into_reader()
                    .take(limit as u64 + 1)
                    .read_to_end(&mut raw)
                    .map_err(|e| IndexerError::Content(e.to_string()))?;
                let (text, truncated) = sanitize_excerpt(&raw, limit);
                Ok(ContentResponse::Excerpt { text, truncated })
            }
            ContentMode::List => {
                let response = agent
                    .get(&url)
                    .query("format", "dag-json")
                    .call()
                    .map_err(NetworkError::from)?;
                let directory: DagDirectory = response
                    .into_json()
                    .map_err(|e| IndexerError::Content(format!("not a directory listing: {e}")))?;
                let entries = directory
                    .links
                    .into_iter()
                    .map(|link| ContentEntry { name: link.name, size: link.size })
                    .collect();
                Ok(ContentResponse::Listing { entries })
            }
        }
    }
}

#[async_trait]
impl ContentGateway for HttpContentGateway {
    async fn fetch(&self, request: &ContentRequest) -> IndexerResult<ContentResponse> {
        if request.content_id.is_empty() {
            return Err(IndexerError::Content("empty content id".to_string()));
        }
        let url = self.url_for(request);
        debug!(%url, mode = ?request.mode, "content gateway request");
        let agent = self.agent.clone();
        let mode = request.mode.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(agent, url, mode))
            .await
            .map_err(|e| IndexerError::Content(format!("gateway task failed: {e}")))?
    }
}

/// Preview access for the bundle a proposal governs
pub struct BundlePreview<G: ContentGateway + ?Sized> {
    gateway: Arc<G>,
}

impl<G: ContentGateway + ?Sized> BundlePreview<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn fetch(
        &self,
        reference: &BundleReference,
        path: Option<&str>,
        mode: ContentMode,
    ) -> IndexerResult<ContentResponse> {
        let mut request = ContentRequest::new(reference.root_content_id.clone(), mode);
        if let Some(path) = path {
            request = request.with_path(path);
        }
        self.gateway.fetch(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_drops_control_characters() {
        let (text, truncated) = sanitize_excerpt(b"<h1>hi</h1>\x1b[31m\r\n\tok\x00", 100);
        assert_eq!(text, "<h1>hi</h1>[31m\n\tok");
        assert!(!truncated);
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let (text, truncated) = sanitize_excerpt("ééé".as_bytes(), 3);
        assert_eq!(text, "é");
        assert!(truncated);
    }

    #[test]
    fn gateway_url_uses_path_style() {
        let gateway = HttpContentGateway::new("https://gateway.example/", Duration::from_secs(5));
        let request = ContentRequest::new("bafyAAA", ContentMode::Head).with_path("index.html");
        assert_eq!(gateway.url_for(&request), "https://gateway.example/ipfs/bafyAAA/index.html");
    }
}
