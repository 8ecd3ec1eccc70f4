// src/config/resolver.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::Vocabulary;
use crate::rank::ScoringParams;

pub const ENV_CONFIG_PATH: &str = "RESOLVER_CONFIG_PATH";
pub const ENV_API_HOST: &str = "COMMONS_API_HOST";
pub const DEFAULT_API_HOST: &str = "https://commons.wikimedia.org";

fn default_user_agent() -> String {
    concat!(
        "paleoart-resolver/",
        env!("CARGO_PKG_VERSION"),
        " (life restoration lookup; reqwest)"
    )
    .to_string()
}

/// Resolver settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Host serving `/w/api.php` for category and search queries.
    pub api_host: String,
    pub user_agent: String,
    /// Requested thumbnail width (`iiurlwidth`).
    pub thumb_width: u32,
    pub category_limit: u32,
    pub search_limit: u32,
    /// Whole-request timeout; transport default when absent.
    pub timeout_secs: Option<u64>,
    /// Rows resolved at once by `Resolver::resolve_all`.
    pub max_concurrent: usize,
    /// Required table columns; the first one identifies the taxon.
    pub required_fields: Vec<String>,
    pub scoring: ScoringParams,
    pub vocabulary: Vocabulary,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            user_agent: default_user_agent(),
            thumb_width: 800,
            category_limit: 20,
            search_limit: 40,
            timeout_secs: None,
            max_concurrent: 4,
            required_fields: vec!["genus".to_string(), "range".to_string()],
            scoring: ScoringParams::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl ResolverConfig {
    /// Load from an explicit path. TOML or JSON by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading resolver config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: ResolverConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
        };
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $RESOLVER_CONFIG_PATH
    /// 2) config/resolver.toml
    /// 3) config/resolver.json
    /// 4) built-in defaults
    ///
    /// `$COMMONS_API_HOST` then overrides `api_host`.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/resolver.toml");
            let json_p = PathBuf::from("config/resolver.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(host) = std::env::var(ENV_API_HOST) {
            let host = host.trim();
            if !host.is_empty() {
                cfg.api_host = host.to_string();
            }
        }
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.api_host = self.api_host.trim().trim_end_matches('/').to_string();
        if self.api_host.is_empty() {
            self.api_host = defaults.api_host;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = defaults.user_agent;
        }
        if self.thumb_width == 0 {
            self.thumb_width = defaults.thumb_width;
        }
        self.max_concurrent = self.max_concurrent.max(1);
        self.required_fields = self
            .required_fields
            .into_iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if self.required_fields.is_empty() {
            self.required_fields = defaults.required_fields;
        }
        self.scoring = self.scoring.sanitized();
        self.vocabulary = self.vocabulary.normalized();
        self
    }
}
