pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use toml_config::TomlConfig;

pub const DEFAULT_API_URL: &str = "https://canvas.instructure.com";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Command line / environment settings. Unset values fall through to the
/// TOML file, then to the built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "course-relay")]
#[command(about = "Relay course listings from a learning-management API to the browser extension")]
pub struct CliArgs {
    #[arg(long, env = "CANVAS_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, env = "CANVAS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECONDS")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<String>,

    #[arg(long, env = "RELAY_CONFIG", help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_url", &self.api_url)
            .field(
                "api_key",
                &self.api_key.as_deref().map(crate::utils::logger::mask_key),
            )
            .field("timeout_seconds", &self.timeout_seconds)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl RelayConfig {
    /// Loads the TOML file named by `args.config` (if any) and merges it.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::info!("Loading configuration file {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        Ok(Self::merge(args, &file))
    }

    pub fn merge(args: &CliArgs, file: &TomlConfig) -> Self {
        let upstream = file.upstream.clone().unwrap_or_default();
        let server = file.server.clone().unwrap_or_default();

        Self {
            api_url: args
                .api_url
                .clone()
                .or(upstream.base_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: args
                .api_key
                .clone()
                .or(upstream.api_key)
                .filter(|k| !k.is_empty()),
            timeout_seconds: args.timeout_seconds.or(upstream.timeout_seconds),
            host: args
                .host
                .clone()
                .or(server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(server.port).unwrap_or(DEFAULT_PORT),
            static_dir: args
                .static_dir
                .clone()
                .or(server.static_dir)
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        }
    }
}

impl ConfigProvider for RelayConfig {
    fn api_base_url(&self) -> &str {
        &self.api_url
    }

    fn default_api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn static_dir(&self) -> &str {
        &self.static_dir
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("api_url", &self.api_url)?;
        validate_non_empty_string("host", &self.host)?;
        validate_positive_number("port", u64::from(self.port), 1)?;
        if let Some(timeout) = self.timeout_seconds {
            validate_range("timeout_seconds", timeout, 1, 300)?;
        }
        validate_non_empty_string("static_dir", &self.static_dir)?;

        if self.api_key.is_none() {
            tracing::warn!("No default API key configured; requests must supply api_key");
        }
        tracing::info!("✅ Relay configuration validation passed");
        Ok(())
    }
}
