use std::sync::Arc;

use serde::Deserialize;

use crate::config::Endpoints;
use crate::error::{AppError, Result};

use super::http::PageSource;

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    shorturl: Option<String>,
}

/// Turns long magnet URIs into short links via the configured API.
pub struct LinkShortener {
    source: Arc<dyn PageSource>,
    endpoints: Endpoints,
}

impl LinkShortener {
    pub fn new(source: Arc<dyn PageSource>, endpoints: Endpoints) -> Self {
        Self { source, endpoints }
    }

    pub async fn shorten_link(&self, magnet: &str) -> Result<String> {
        let body = self.source.fetch_text(&self.endpoints.shorten(magnet)).await?;
        let response: ShortenResponse = serde_json::from_str(&body)?;

        response
            .shorturl
            .ok_or_else(|| AppError::UpstreamShape("no `shorturl` in shortener response".to_string()))
    }
}
