use clap::Parser;
use reqwest::Url;
use std::time::Duration;

use crate::error::ConfigError;

// One year; keeps `Instant + window` far from overflow
pub const MAX_RATE_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "ubett-waitlist")]
#[command(about = "Waitlist signup service for the Ubett landing page")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Supabase project URL, e.g. "https://abcd.supabase.co"
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    // Service role key used for PostgREST calls
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    // Public site URL, only its origin is used for the CSRF check
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,

    // Max signup attempts per client per window
    #[arg(long, env = "WAITLIST_RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(
        long,
        env = "WAITLIST_RATE_WINDOW",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..=MAX_RATE_WINDOW_SECS)
    )]
    pub rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(
        long,
        env = "WAITLIST_SWEEP_INTERVAL",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval: u64,

    // Count endpoint cache TTL in seconds
    #[arg(long, env = "WAITLIST_COUNT_CACHE_TTL", default_value_t = 60)]
    pub count_cache_ttl: u64,

    // Datastore request timeout in seconds
    #[arg(
        long,
        env = "WAITLIST_STORE_TIMEOUT",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub store_timeout: u64,
}

impl Args {
    /// Url and service key, only when both are set.
    pub fn store_credentials(&self) -> Option<(&str, &str)> {
        Some((
            present(&self.supabase_url)?,
            present(&self.supabase_service_role_key)?,
        ))
    }

    pub fn site_origin(&self) -> Result<Option<String>, ConfigError> {
        present(&self.site_url).map(site_origin).transpose()
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn count_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.count_cache_ttl)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout)
    }
}

// Empty values count as unset
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Reduces a site URL to its `scheme://host[:port]` origin.
///
/// Opaque origins (`file:`, `data:` ...) serialize as `"null"` and would
/// match a literal `Origin: null` header, so they are refused.
pub fn site_origin(site_url: &str) -> Result<String, ConfigError> {
    let url = Url::parse(site_url).map_err(|e| ConfigError::InvalidSiteUrl {
        value: site_url.to_string(),
        reason: e.to_string(),
    })?;

    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(ConfigError::InvalidSiteUrl {
            value: site_url.to_string(),
            reason: "URL has no host origin".to_string(),
        });
    }

    Ok(origin.ascii_serialization())
}
