use std::time::Duration;

pub const DEFAULT_AIPO_BASE_URL: &str = "https://aipo.myiqdii.com";
pub const DEFAULT_JYB_BASE_URL: &str = "https://jybdata.iqdii.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; HKIPO-MCP-Server)";

/// Environment variable read when `TOKEN` is not set
pub(crate) const LEGACY_TOKEN_ENV: &str = "REQUEST_VERIFICATION_TOKEN";

/// Upstream connection settings, from flags or environment variables
#[derive(Debug, Clone, clap::Args)]
pub struct UpstreamConfig {
    /// Base URL of the listing and detail host
    #[clap(long, env = "AIPO_BASE_URL", global = true, default_value = DEFAULT_AIPO_BASE_URL)]
    pub aipo_base_url: String,

    /// Base URL of the placing-result host
    #[clap(long, env = "JYB_BASE_URL", global = true, default_value = DEFAULT_JYB_BASE_URL)]
    pub jyb_base_url: String,

    /// User agent sent with every upstream request
    #[clap(long, env = "AIPO_USER_AGENT", global = true, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Request verification token for the detail endpoint
    #[clap(long, env = "TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Upstream request timeout in seconds
    #[clap(long = "timeout", env = "HKIPO_TIMEOUT", global = true, default_value = "30")]
    pub timeout_secs: u64,

    /// Requests allowed per window (reported, not enforced)
    #[clap(long, env = "RATE_LIMIT", global = true, default_value = "100")]
    pub rate_limit: u32,

    /// Rate-limit window in seconds (reported, not enforced)
    #[clap(long, env = "RATE_LIMIT_WINDOW", global = true, default_value = "3600")]
    pub rate_limit_window: u64,
}

impl UpstreamConfig {
    /// The configured token, falling back to `REQUEST_VERIFICATION_TOKEN`
    pub fn verification_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(LEGACY_TOKEN_ENV).ok())
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
