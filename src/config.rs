use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub const DEFAULT_PRIMARY_ENDPOINT: &str = "https://wol.jw.org/ja/wol/s/r7/lp-j";
pub const DEFAULT_SECONDARY_ENDPOINT: &str = "https://wol.jw.org/en/wol/s/r1/lp-e";

/// Page ceiling of a bounded search when none is requested.
pub const DEFAULT_MAX_PAGES: u32 = 3;
/// Largest page ceiling a bounded search accepts.
pub const MAX_BOUNDED_PAGES: u32 = 10;

/// Fixed delay between pages in bounded mode.
pub const BOUNDED_DELAY: Duration = Duration::from_millis(500);
pub const MIN_UNBOUNDED_DELAY: Duration = Duration::from_millis(100);
pub const MAX_UNBOUNDED_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_UNBOUNDED_DELAY: Duration = Duration::from_millis(500);

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        primary_endpoint: get_env_or_default("WOL_PRIMARY_ENDPOINT", DEFAULT_PRIMARY_ENDPOINT),
        secondary_endpoint: get_env_or_default(
            "WOL_SECONDARY_ENDPOINT",
            DEFAULT_SECONDARY_ENDPOINT,
        ),
        user_agent: get_env_or_default(
            "WOL_USER_AGENT",
            concat!("wol-search/", env!("CARGO_PKG_VERSION")),
        ),
        http_timeout_secs: get_env_parsed_or_default("WOL_HTTP_TIMEOUT_SECS", 30),
        api_addr: get_env_or_default("WOL_API_ADDR", "127.0.0.1:3000"),
    }
});

#[derive(Debug, Clone)]
pub struct Config {
    pub primary_endpoint: String,
    pub secondary_endpoint: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub api_addr: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring non-numeric {key}={raw:?}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

/// How many pages a session may fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCeiling {
    /// At most this many pages (always >= 1).
    Limited(u32),
    /// As many pages as the server reports on page 1.
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub page_ceiling: PageCeiling,
    pub inter_page_delay: Duration,
}

impl SessionConfig {
    pub fn bounded(max_pages: u32) -> SessionConfig {
        SessionConfig {
            page_ceiling: PageCeiling::Limited(max_pages.max(1)),
            inter_page_delay: BOUNDED_DELAY,
        }
    }

    /// The delay is clamped into `MIN_UNBOUNDED_DELAY..=MAX_UNBOUNDED_DELAY`.
    pub fn unbounded(delay: Duration) -> SessionConfig {
        SessionConfig {
            page_ceiling: PageCeiling::Unbounded,
            inter_page_delay: delay.clamp(MIN_UNBOUNDED_DELAY, MAX_UNBOUNDED_DELAY),
        }
    }

    pub fn without_delay(mut self) -> SessionConfig {
        self.inter_page_delay = Duration::ZERO;
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.page_ceiling == PageCeiling::Unbounded
    }

    /// Ceiling actually enforced once page 1 reported `server_total_pages`.
    pub fn effective_ceiling(&self, server_total_pages: u32) -> u32 {
        match self.page_ceiling {
            PageCeiling::Limited(max) => max.min(server_total_pages),
            PageCeiling::Unbounded => server_total_pages,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::bounded(DEFAULT_MAX_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_uses_fixed_delay() {
        let config = SessionConfig::bounded(5);
        assert_eq!(config.page_ceiling, PageCeiling::Limited(5));
        assert_eq!(config.inter_page_delay, BOUNDED_DELAY);
        assert!(!config.is_unbounded());
    }

    #[test]
    fn test_bounded_zero_becomes_one() {
        assert_eq!(SessionConfig::bounded(0).page_ceiling, PageCeiling::Limited(1));
    }

    #[test]
    fn test_unbounded_delay_is_clamped() {
        assert_eq!(
            SessionConfig::unbounded(Duration::ZERO).inter_page_delay,
            MIN_UNBOUNDED_DELAY
        );
        assert_eq!(
            SessionConfig::unbounded(Duration::from_secs(10)).inter_page_delay,
            MAX_UNBOUNDED_DELAY
        );
        assert_eq!(
            SessionConfig::unbounded(Duration::from_millis(700)).inter_page_delay,
            Duration::from_millis(700)
        );
    }

    #[test]
    fn test_effective_ceiling() {
        assert_eq!(SessionConfig::bounded(10).effective_ceiling(3), 3);
        assert_eq!(SessionConfig::bounded(3).effective_ceiling(12), 3);
        assert_eq!(
            SessionConfig::unbounded(DEFAULT_UNBOUNDED_DELAY).effective_ceiling(7),
            7
        );
    }

    #[test]
    fn test_default_is_bounded_within_limit() {
        let config = SessionConfig::default();
        assert_eq!(config.page_ceiling, PageCeiling::Limited(DEFAULT_MAX_PAGES));
        assert!((1..=MAX_BOUNDED_PAGES).contains(&DEFAULT_MAX_PAGES));
        assert!((MIN_UNBOUNDED_DELAY..=MAX_UNBOUNDED_DELAY).contains(&DEFAULT_UNBOUNDED_DELAY));
    }

    #[test]
    fn test_without_delay() {
        assert_eq!(
            SessionConfig::bounded(2).without_delay().inter_page_delay,
            Duration::ZERO
        );
    }
}
