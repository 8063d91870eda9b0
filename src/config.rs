//! Process-start configuration for the console.
//! Values are read once from the environment; nothing here changes at runtime.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

pub const API_URL_ENV: &str = "DICRI_API_URL";
pub const SESSION_FILE_ENV: &str = "DICRI_SESSION_FILE";
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// None disables persistence (session lives in memory only).
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            session_file: Some(crate::system_paths::default_session_file()),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|s| !s.trim().is_empty()) {
            cfg.base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(SESSION_FILE_ENV).filter(|s| !s.trim().is_empty()) {
            cfg.session_file = Some(PathBuf::from(path.trim()));
        }
        cfg
    }

    pub fn with_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn without_persistence(mut self) -> Self {
        self.session_file = None;
        self
    }

    /// Parsed base URL, always ending in '/' so relative joins keep the path prefix.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let mut s = self.base_url.clone();
        if !s.ends_with('/') { s.push('/'); }
        Url::parse(&s).with_context(|| format!("invalid API base URL: {}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_missing() {
        let cfg = ClientConfig::from_lookup(|_| None);
        assert_eq!(cfg.base_url, DEFAULT_API_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert!(cfg.session_file.is_some());
    }

    #[test]
    fn env_overrides() {
        let cfg = ClientConfig::from_lookup(|k| match k {
            API_URL_ENV => Some("https://dicri.example.gt/api".into()),
            SESSION_FILE_ENV => Some("/tmp/s.json".into()),
            _ => None,
        });
        assert_eq!(cfg.base_url, "https://dicri.example.gt/api");
        assert_eq!(cfg.session_file, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn blank_env_falls_back() {
        let cfg = ClientConfig::from_lookup(|k| if k == API_URL_ENV { Some("   ".into()) } else { None });
        assert_eq!(cfg.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let cfg = ClientConfig::default().with_base_url("http://localhost:3000/api");
        let base = cfg.parsed_base_url().unwrap();
        assert_eq!(base.join("expedientes").unwrap().as_str(), "http://localhost:3000/api/expedientes");
    }
}
