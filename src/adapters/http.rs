use crate::domain::ports::UpstreamClient;
use crate::utils::error::{RelayError, Result, UpstreamFailure};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReqwestUpstreamClient {
    client: Client,
}

impl ReqwestUpstreamClient {
    /// `timeout` of `None` keeps reqwest's default (no overall timeout).
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("course-relay/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| RelayError::ConfigError {
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn get_json(
        &self,
        base_url: &str,
        path: &str,
        bearer_token: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<Value, UpstreamFailure> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);

        tracing::debug!("Making upstream request to: {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer_token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamFailure::transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!("Upstream response status: {}", status);

        if !status.is_success() {
            return Err(UpstreamFailure::with_status(
                status.as_u16(),
                format!("upstream returned {} for {}", status, url),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamFailure::transport(format!("invalid JSON from upstream: {}", e)))
    }
}
