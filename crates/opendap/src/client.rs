//! HTTP client for DAP2 endpoints.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use crate::ascii::{parse_ascii, AsciiArray};
use crate::das::Das;
use crate::dds::Dds;
use crate::error::{DapError, DapResult};

/// Configuration for the DAP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total time allowed for one HTTP request.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            user_agent: concat!("gfs-viewer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches DDS, DAS and ASCII responses for a dataset URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DapClient {
    http: Client,
    request_timeout: Duration,
}

impl DapClient {
    pub fn new(config: ClientConfig) -> DapResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            http,
            request_timeout: config.request_timeout,
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_dds(&self, target: &str) -> DapResult<Dds> {
        let text = self.get_text(&format!("{}.dds", target)).await?;
        Dds::parse(&text)
    }

    #[instrument(skip(self))]
    pub async fn fetch_das(&self, target: &str) -> DapResult<Das> {
        let text = self.get_text(&format!("{}.das", target)).await?;
        Das::parse(&text)
    }

    #[instrument(skip(self))]
    pub async fn fetch_ascii(&self, target: &str, constraint: &str) -> DapResult<Vec<AsciiArray>> {
        let text = self
            .get_text(&format!("{}.ascii?{}", target, constraint))
            .await?;
        parse_ascii(&text)
    }

    async fn get_text(&self, url: &str) -> DapResult<String> {
        debug!(url = %url, "DAP request");

        let response = self.http.get(url).send().await.map_err(|e| self.map_err(e))?;
        let status = response.status();
        // GrADS servers answer unknown datasets with an error document, sometimes
        // under a non-2xx status; prefer its message when present.
        let body = response.text().await.map_err(|e| self.map_err(e))?;

        if !status.is_success() {
            crate::dds::check_error_document(&body)?;
            return Err(DapError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        debug!(url = %url, bytes = body.len(), "DAP response");
        Ok(body)
    }

    fn map_err(&self, err: reqwest::Error) -> DapError {
        if err.is_timeout() {
            DapError::Timeout(self.request_timeout)
        } else {
            DapError::Http(err)
        }
    }
}
