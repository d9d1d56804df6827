//! Central configuration for the data layer: runtime limits, environment
//! keys, and the explicit endpoint configuration handed to the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use timemap_core::Domain;

/// Default per-domain fetch timeout (milliseconds).
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;

/// Minimum allowed per-domain fetch timeout (milliseconds).
pub const MIN_FETCH_TIMEOUT_MS: u64 = 100;

/// Maximum allowed per-domain fetch timeout (milliseconds).
pub const MAX_FETCH_TIMEOUT_MS: u64 = 120_000;

/// Convenience function to clamp a timeout value into allowed range.
pub fn clamp_timeout_ms(v: u64) -> u64 {
    v.clamp(MIN_FETCH_TIMEOUT_MS, MAX_FETCH_TIMEOUT_MS)
}

/// Environment variable names.
pub mod keys {
    pub const SERVER_ROOT: &str = "SERVER_ROOT";
    pub const EVENT_EXT: &str = "EVENT_EXT";
    pub const CATEGORY_EXT: &str = "CATEGORY_EXT";
    pub const NARRATIVE_EXT: &str = "NARRATIVE_EXT";
    pub const SITES_EXT: &str = "SITES_EXT";
    pub const TAGS_EXT: &str = "TAGS_EXT";
    pub const SOURCES_EXT: &str = "SOURCES_EXT";
    pub const EVENT_DESC_ROOT: &str = "EVENT_DESC_ROOT";
    pub const USE_SITES: &str = "USE_SITES";
    pub const USE_TAGS: &str = "USE_TAGS";
    pub const USE_SOURCES: &str = "USE_SOURCES";
    pub const FETCH_TIMEOUT_MS: &str = "FETCH_TIMEOUT_MS";
}

/// Environment key holding the path suffix for `domain`.
pub fn suffix_key(domain: Domain) -> &'static str {
    match domain {
        Domain::Events => keys::EVENT_EXT,
        Domain::Categories => keys::CATEGORY_EXT,
        Domain::Narratives => keys::NARRATIVE_EXT,
        Domain::Sites => keys::SITES_EXT,
        Domain::Tags => keys::TAGS_EXT,
        Domain::Sources => keys::SOURCES_EXT,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a boolean, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },
    #[error("{key} must be a number of milliseconds, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub use_sites: bool,
    pub use_tags: bool,
    pub use_sources: bool,
}

impl FeatureFlags {
    /// Whether `domain` may be fetched. Required domains are always enabled.
    pub fn allows(&self, domain: Domain) -> bool {
        match domain {
            Domain::Sites => self.use_sites,
            Domain::Tags => self.use_tags,
            Domain::Sources => self.use_sources,
            Domain::Events | Domain::Categories | Domain::Narratives => true,
        }
    }
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}

/// Resolved absolute URL per domain. A domain without a URL is never fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainEndpoints {
    urls: BTreeMap<Domain, String>,
}

impl DomainEndpoints {
    pub fn get(&self, domain: Domain) -> Option<&str> {
        self.urls.get(&domain).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, &str)> {
        self.urls.iter().map(|(d, u)| (*d, u.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLayerConfig {
    pub server_root: String,
    /// Path suffix appended to `server_root`, per domain.
    pub domain_paths: BTreeMap<Domain, String>,
    pub event_desc_root: Option<String>,
    pub features: FeatureFlags,
    pub fetch_timeout_ms: u64,
}

impl Default for DataLayerConfig {
    fn default() -> Self {
        Self {
            server_root: String::new(),
            domain_paths: BTreeMap::new(),
            event_desc_root: None,
            features: FeatureFlags::default(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl DataLayerConfig {
    /// Builds the config from an arbitrary key lookup, e.g. the process
    /// environment or a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain_paths = Domain::ALL
            .into_iter()
            .filter_map(|d| lookup(suffix_key(d)).map(|suffix| (d, suffix)))
            .collect();

        let features = FeatureFlags {
            use_sites: parse_flag(keys::USE_SITES, lookup(keys::USE_SITES))?,
            use_tags: parse_flag(keys::USE_TAGS, lookup(keys::USE_TAGS))?,
            use_sources: parse_flag(keys::USE_SOURCES, lookup(keys::USE_SOURCES))?,
        };

        let fetch_timeout_ms = match lookup(keys::FETCH_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(clamp_timeout_ms)
                .map_err(|_| ConfigError::InvalidTimeout {
                    key: keys::FETCH_TIMEOUT_MS,
                    value: raw,
                })?,
            None => DEFAULT_FETCH_TIMEOUT_MS,
        };

        Ok(Self {
            server_root: lookup(keys::SERVER_ROOT).unwrap_or_default(),
            domain_paths,
            event_desc_root: lookup(keys::EVENT_DESC_ROOT),
            features,
            fetch_timeout_ms,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut cfg: DataLayerConfig = serde_json::from_str(&raw)?;
        cfg.fetch_timeout_ms = clamp_timeout_ms(cfg.fetch_timeout_ms);
        Ok(cfg)
    }

    /// Absolute URL for `domain`, or `None` when its suffix is unset or empty.
    pub fn endpoint(&self, domain: Domain) -> Option<String> {
        self.domain_paths
            .get(&domain)
            .filter(|suffix| !suffix.trim().is_empty())
            .map(|suffix| format!("{}{}", self.server_root, suffix))
    }

    pub fn resolve(&self) -> DomainEndpoints {
        let urls = Domain::ALL
            .into_iter()
            .filter_map(|d| self.endpoint(d).map(|url| (d, url)))
            .collect();
        DomainEndpoints { urls }
    }

    /// Description page for an event.
    pub fn event_url(&self, event_id: &str) -> Option<String> {
        self.event_desc_root
            .as_deref()
            .filter(|root| !root.trim().is_empty())
            .map(|root| format!("{}{}/{}", self.server_root, root, event_id))
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(clamp_timeout_ms(self.fetch_timeout_ms))
    }

    pub fn with_path(mut self, domain: Domain, suffix: impl Into<String>) -> Self {
        self.domain_paths.insert(domain, suffix.into());
        self
    }
}
