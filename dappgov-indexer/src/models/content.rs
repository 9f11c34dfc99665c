//! Request and response shapes for the content-retrieval bridge

use serde::{Deserialize, Serialize};

/// What to retrieve for a content id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ContentMode {
    List,
    Head,
    Excerpt { max_bytes: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub content_id: String,
    pub path: Option<String>,
    pub mode: ContentMode,
}

impl ContentRequest {
    pub fn new(content_id: impl Into<String>, mode: ContentMode) -> Self {
        Self {
            content_id: content_id.into(),
            path: None,
            mode,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// `<content_id>/<path>` with leading slashes and parent segments removed
    pub fn resource(&self) -> String {
        match self.path.as_deref() {
            Some(path) => {
                let clean: Vec<&str> = path
                    .split('/')
                    .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
                    .collect();
                if clean.is_empty() {
                    self.content_id.clone()
                } else {
                    format!("{}/{}", self.content_id, clean.join("/"))
                }
            }
            None => self.content_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub name: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ContentResponse {
    Listing { entries: Vec<ContentEntry> },
    Head { size: Option<u64>, content_type: Option<String> },
    Excerpt { text: String, truncated: bool },
}
