//! Configuration
//!
//! Two layers:
//! - [`SiteConfig`]: Ktuvit endpoint layout, fixed per client instance
//! - [`Config`]: user settings stored at ~/.config/ktuvit/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::charset::HEBREW_FALLBACK;

/// Ktuvit's current address
pub const DEFAULT_BASE_URL: &str = "https://www.ktuvit.me";

/// Environment variable overriding the stored login cookie
pub const LOGIN_COOKIE_ENV: &str = "KTUVIT_LOGIN_COOKIE";

/// Endpoint layout of the site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    base_url: String,
}

impl SiteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn search_url(&self) -> String {
        format!("{}/Services/ContentProvider.svc/SearchPage_search", self.base_url)
    }

    pub fn movie_info_url(&self, ktuvit_id: &str) -> String {
        format!(
            "{}/MovieInfo.aspx?ID={}",
            self.base_url,
            urlencoding::encode(ktuvit_id)
        )
    }

    pub fn episode_info_url(&self, ktuvit_id: &str, season: u32, episode: u32) -> String {
        format!(
            "{}/Services/GetModuleAjax.ashx?moduleName=SubtitlesList&SeriesID={}&Season={}&Episode={}",
            self.base_url,
            urlencoding::encode(ktuvit_id),
            season,
            episode
        )
    }

    pub fn download_token_url(&self) -> String {
        format!(
            "{}/Services/ContentProvider.svc/RequestSubtitleDownload",
            self.base_url
        )
    }

    pub fn download_url(&self, token: &str) -> String {
        format!(
            "{}/Services/DownloadFile.ashx?DownloadIdentifier={}",
            self.base_url,
            urlencoding::encode(token)
        )
    }

    pub fn login_url(&self) -> String {
        format!("{}/Services/MembershipService.svc/Login", self.base_url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Behaviour switches for a client instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Keep resolved IDs for 12 hours
    pub cache_enabled: bool,
    /// Bytes to inspect before freezing the detected charset (None = whole body)
    pub sample_limit: Option<usize>,
    /// Charset used when detection has nothing to go on
    pub fallback_encoding: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            sample_limit: None,
            fallback_encoding: HEBREW_FALLBACK.to_string(),
        }
    }
}

/// User configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Value of Ktuvit's `Login` cookie
    pub login_cookie: Option<String>,
    /// Disable with `cache_enabled = false`
    pub cache_enabled: Option<bool>,
    pub sample_limit: Option<usize>,
    /// Override for testing against a mirror
    pub base_url: Option<String>,
}

impl Config {
    /// Get config file path (~/.config/ktuvit/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ktuvit").join("config.toml"))
    }

    /// Load config from the default path, or defaults if missing
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from `path`, or defaults if missing or invalid
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Login cookie: environment first, then the config file
    pub fn login_cookie(&self) -> Option<String> {
        std::env::var(LOGIN_COOKIE_ENV)
            .ok()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.login_cookie.clone())
    }

    pub fn site(&self) -> SiteConfig {
        self.base_url
            .as_deref()
            .map(SiteConfig::new)
            .unwrap_or_default()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            cache_enabled: self.cache_enabled.unwrap_or(true),
            sample_limit: self.sample_limit,
            ..ClientOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_urls() {
        let site = SiteConfig::new("https://www.ktuvit.me/");
        assert_eq!(site.base_url(), "https://www.ktuvit.me");
        assert_eq!(
            site.search_url(),
            "https://www.ktuvit.me/Services/ContentProvider.svc/SearchPage_search"
        );
        assert_eq!(site.movie_info_url("42"), "https://www.ktuvit.me/MovieInfo.aspx?ID=42");
        assert_eq!(
            site.episode_info_url("7", 1, 2),
            "https://www.ktuvit.me/Services/GetModuleAjax.ashx?moduleName=SubtitlesList&SeriesID=7&Season=1&Episode=2"
        );
        assert_eq!(
            site.download_url("ab/c"),
            "https://www.ktuvit.me/Services/DownloadFile.ashx?DownloadIdentifier=ab%2Fc"
        );
    }

    #[test]
    fn test_client_options_defaults() {
        let opts = ClientOptions::default();
        assert!(opts.cache_enabled);
        assert_eq!(opts.sample_limit, None);
        assert_eq!(opts.fallback_encoding, "ISO-8859-8");
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = std::env::temp_dir().join(format!("ktuvit-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        let config = Config {
            login_cookie: Some("secret".into()),
            cache_enabled: Some(false),
            sample_limit: Some(4096),
            base_url: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.login_cookie.as_deref(), Some("secret"));
        let opts = loaded.client_options();
        assert!(!opts.cache_enabled);
        assert_eq!(opts.sample_limit, Some(4096));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_config_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/ktuvit/config.toml"));
        assert!(config.login_cookie.is_none());
        assert!(config.client_options().cache_enabled);
        assert_eq!(config.site(), SiteConfig::default());
    }
}
