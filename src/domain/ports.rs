use crate::utils::error::UpstreamFailure;
use async_trait::async_trait;

/// Read-only access to the learning-management REST API.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// `GET {base_url}{path}` with bearer auth; returns the decoded JSON body.
    async fn get_json(
        &self,
        base_url: &str,
        path: &str,
        bearer_token: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<serde_json::Value, UpstreamFailure>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn default_api_key(&self) -> Option<&str>;
    fn listen_addr(&self) -> String;
    fn static_dir(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
}
