use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),
}

/// Opaque cursor handed to clients for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub page: usize,
}

impl PageToken {
    pub fn new(page: usize) -> Self {
        Self { page }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of one integer cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, RankingError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| RankingError::InvalidPageToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RankingError::InvalidPageToken(e.to_string()))
    }
}

/// Token for the page after `page`, present iff more entries follow it.
pub fn next_page_token(page: usize, page_size: usize, total_count: usize) -> Option<String> {
    let seen = page.saturating_mul(page_size).saturating_add(page_size);
    (seen < total_count).then(|| PageToken::new(page + 1).encode())
}
