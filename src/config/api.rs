//! API Config

use clap::Args;

/// REST API connection settings.
#[derive(Debug, Clone, Args)]
pub struct ApiConfig {
    /// Base URL of the marketplace API
    #[arg(
        long = "api-url",
        env = "BAZAAR_API_URL",
        default_value = "http://localhost:8000/api"
    )]
    pub base_url: String,

    /// Bearer token sent with every request
    #[arg(long = "api-token", env = "BAZAAR_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "BAZAAR_HTTP_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub timeout_seconds: u64,
}
