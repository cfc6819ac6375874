use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::CountCache;
use crate::config::Args;
use crate::error::ConfigError;
use crate::rate_limit::RateLimiter;
use crate::store::{SupabaseStore, WaitlistStore};

// app's shared state
pub struct AppState {
    pub store: Option<Arc<dyn WaitlistStore>>, // None until datastore credentials are provided
    pub rate_limiter: RateLimiter,
    pub site_origin: Option<String>,
    pub count_cache: CountCache,
}

impl AppState {
    pub fn new(
        store: Option<Arc<dyn WaitlistStore>>,
        rate_limiter: RateLimiter,
        site_origin: Option<String>,
        count_cache: CountCache,
    ) -> Self {
        Self {
            store,
            rate_limiter,
            site_origin,
            count_cache,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let store: Option<Arc<dyn WaitlistStore>> = match args.store_credentials() {
            Some((url, key)) => {
                let store = SupabaseStore::new(url, key, args.store_timeout())
                    .map_err(ConfigError::StoreClient)?;
                info!(url, timeout = ?args.store_timeout(), "waitlist datastore configured");
                Some(Arc::new(store))
            }
            None => {
                warn!("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set, signups will answer 503");
                None
            }
        };

        let site_origin = args.site_origin()?;
        match &site_origin {
            Some(origin) => info!(origin = %origin, "origin check pinned to site origin"),
            None => warn!("SITE_URL not set, origin check falls back to host header"),
        }

        info!(
            "Rate limit: {} requests per {} seconds",
            args.rate_limit, args.rate_window
        );

        Ok(Self::new(
            store,
            RateLimiter::new(args.rate_limit, args.rate_window()),
            site_origin,
            CountCache::new(args.count_cache_ttl()),
        ))
    }

    pub fn store_configured(&self) -> bool {
        self.store.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn missing_credentials_leave_store_unset() {
        // Explicit empty flags win over any exported SUPABASE_* variables
        let args = Args::try_parse_from([
            "ubett-waitlist",
            "--supabase-url",
            "",
            "--supabase-service-role-key",
            "",
            "--site-url",
            "https://ubett.app/",
        ])
        .unwrap();
        let state = AppState::from_args(&args).unwrap();

        assert!(args.store_credentials().is_none());
        assert!(!state.store_configured());
        assert_eq!(state.site_origin.as_deref(), Some("https://ubett.app"));
    }

    #[test]
    fn full_configuration_builds_store() {
        let args = Args::try_parse_from([
            "ubett-waitlist",
            "--supabase-url",
            "https://abcd.supabase.co",
            "--supabase-service-role-key",
            "service-key",
        ])
        .unwrap();

        assert!(AppState::from_args(&args).unwrap().store_configured());
    }

    #[test]
    fn malformed_site_url_is_a_startup_error() {
        let args =
            Args::try_parse_from(["ubett-waitlist", "--site-url", "ubett dot app"]).unwrap();

        assert!(matches!(
            AppState::from_args(&args),
            Err(ConfigError::InvalidSiteUrl { .. })
        ));
    }
}
