// src/config.rs
//! Application settings from TOML.
//!
//! Lookup order:
//! 1) $SENTIMENT_CONFIG_PATH (must exist when set)
//! 2) config/analyzer.toml
//! 3) built-in defaults
//!
//! Every key is optional; missing keys fall back to the defaults below.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/analyzer.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditSettings,
    pub keywords: KeywordSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub default_subreddit: String,
    pub default_limit: usize,
    pub min_limit: usize,
    pub max_limit: usize,
    /// Used when REDDIT_USER_AGENT is not set.
    pub user_agent: String,
    pub auth_url: String,
    pub api_url: String,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            default_subreddit: "all".to_string(),
            default_limit: 50,
            min_limit: 10,
            max_limit: 200,
            user_agent: "social-sentiment-analyzer/0.1".to_string(),
            auth_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_url: "https://oauth.reddit.com".to_string(),
        }
    }
}

impl RedditSettings {
    /// Requested limit (or the default) clamped into `min_limit..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(self.min_limit, self.max_limit)
    }

    /// Blank subreddit means the default one.
    pub fn subreddit_or_default<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => self.default_subreddit.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    /// Keyword lists (dashboard lists, summary report).
    pub list_top_n: usize,
    /// Word clouds.
    pub cloud_top_n: usize,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            list_top_n: 10,
            cloud_top_n: 50,
        }
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    fn sanitized(mut self) -> Self {
        let r = &mut self.reddit;
        if r.min_limit == 0 {
            r.min_limit = 1;
        }
        if r.min_limit > r.max_limit {
            std::mem::swap(&mut r.min_limit, &mut r.max_limit);
        }
        r.default_limit = r.default_limit.clamp(r.min_limit, r.max_limit);
        if r.default_subreddit.trim().is_empty() {
            r.default_subreddit = RedditSettings::default().default_subreddit;
        }
        if self.keywords.list_top_n == 0 {
            self.keywords.list_top_n = KeywordSettings::default().list_top_n;
        }
        if self.keywords.cloud_top_n == 0 {
            self.keywords.cloud_top_n = KeywordSettings::default().cloud_top_n;
        }
        self
    }
}
