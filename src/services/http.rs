use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Where remote pages come from. Every scrape goes through this seam.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned pages by exact URL and records every request.
    #[derive(Default)]
    pub struct StubSource {
        pages: Mutex<HashMap<String, String>>,
        requests: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.set_page(url, body);
            self
        }

        pub fn set_page(&self, url: impl Into<String>, body: impl Into<String>) {
            self.pages.lock().unwrap().insert(url.into(), body.into());
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn fetch_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::Network(format!("HTTP 404 from {}", url)))
        }
    }
}
