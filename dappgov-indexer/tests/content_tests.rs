//! Bundle previews through a recording content gateway

use alloy_primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use dappgov_indexer::content::BundlePreview;
use dappgov_indexer::core::{ContentGateway, IndexerError, IndexerResult};
use dappgov_indexer::models::{
    BundleAction, BundleReference, ContentEntry, ContentMode, ContentRequest, ContentResponse,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingGateway {
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentGateway for RecordingGateway {
    async fn fetch(&self, request: &ContentRequest) -> IndexerResult<ContentResponse> {
        let resource = request.resource();
        self.requests
            .lock()
            .map_err(|e| IndexerError::Content(e.to_string()))?
            .push(resource.clone());
        match request.mode {
            ContentMode::List => Ok(ContentResponse::Listing {
                entries: vec![ContentEntry { name: "index.html".to_string(), size: Some(512) }],
            }),
            ContentMode::Head => Ok(ContentResponse::Head {
                size: Some(512),
                content_type: Some("text/html".to_string()),
            }),
            ContentMode::Excerpt { .. } => Err(IndexerError::Content(format!("{resource} not pinned"))),
        }
    }
}

fn upgrade_reference() -> BundleReference {
    BundleReference {
        action: BundleAction::Upgrade,
        root_content_id: "bafyNEW".to_string(),
        dapp_id: Some(U256::from(4u64)),
    }
}

#[tokio::test]
async fn test_preview_addresses_bundle_root() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let preview = BundlePreview::new(gateway.clone());

    let listing = preview.fetch(&upgrade_reference(), None, ContentMode::List).await?;
    assert!(matches!(listing, ContentResponse::Listing { ref entries } if entries.len() == 1));

    let head = preview
        .fetch(&upgrade_reference(), Some("../../etc/./index.html"), ContentMode::Head)
        .await?;
    assert_eq!(
        head,
        ContentResponse::Head { size: Some(512), content_type: Some("text/html".to_string()) }
    );

    let requests = gateway.requests.lock().map(|r| r.clone()).unwrap_or_default();
    assert_eq!(requests, vec!["bafyNEW".to_string(), "bafyNEW/etc/index.html".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_gateway_errors_propagate() {
    let preview = BundlePreview::new(Arc::new(RecordingGateway::default()));
    let err = preview
        .fetch(&upgrade_reference(), Some("app.js"), ContentMode::Excerpt { max_bytes: 1024 })
        .await
        .unwrap_err();
    assert!(matches!(err, IndexerError::Content(_)));
}

#[test]
fn test_response_serializes_with_kind_tag() -> Result<()> {
    let response = ContentResponse::Excerpt { text: "<h1>hi</h1>".to_string(), truncated: false };
    let json = serde_json::to_value(&response)?;
    assert_eq!(json["kind"], "excerpt");
    assert_eq!(json["truncated"], false);
    Ok(())
}
