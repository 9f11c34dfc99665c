//! Proposal to content-bundle link

use alloy_primitives::{hex, U256};
use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BundleAction {
    Publish,
    Upgrade,
}

/// The content bundle a proposal publishes or upgrades to
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleReference {
    pub action: BundleAction,
    pub root_content_id: String,
    /// Only set for upgrades
    pub dapp_id: Option<U256>,
}

/// Decode an on-chain content id: UTF-8 text with trailing zero padding removed
pub fn decode_content_id(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    match String::from_utf8_lossy(&raw[..end]) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            debug!(raw = %hex::encode(&raw[..end]), "content id is not valid UTF-8, invalid bytes replaced");
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_padding() {
        let mut raw = b"bafyAAA".to_vec();
        raw.extend_from_slice(&[0u8; 25]);
        assert_eq!(decode_content_id(&raw), "bafyAAA");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_content_id(b"bafy\xffA\0\0"), "bafy\u{FFFD}A");
    }

    #[test]
    fn all_zero_is_empty() {
        assert_eq!(decode_content_id(&[0u8; 32]), "");
        assert_eq!(decode_content_id(&[]), "");
    }
}
