//! Client configuration from environment.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix every API path is appended to (scheme, host and optional path).
    pub base_url: String,
    /// Page size for paginated list requests.
    pub page_limit: usize,
    /// Drop list responses that complete after a newer one was applied.
    pub discard_stale: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), page_limit: DEFAULT_PAGE_LIMIT, discard_stale: false }
    }
}

impl ClientConfig {
    /// Read `RESREG_API_BASE`, `RESREG_PAGE_LIMIT` and `RESREG_DISCARD_STALE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(base) = lookup("RESREG_API_BASE").filter(|s| !s.trim().is_empty()) {
            cfg.base_url = base.trim().to_string();
        }
        if let Some(raw) = lookup("RESREG_PAGE_LIMIT") {
            match raw.trim().parse::<usize>() {
                Ok(n) => cfg.page_limit = n,
                Err(_) => warn!(value = %raw, "invalid RESREG_PAGE_LIMIT; using default"),
            }
        }
        cfg.page_limit = cfg.page_limit.max(1);
        cfg.discard_stale = lookup("RESREG_DISCARD_STALE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        cfg
    }
}
