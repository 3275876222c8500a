//! Ktuvit - Hebrew subtitles from ktuvit.me
//!
//! Resolves an IMDB ID to Ktuvit's own title ID, lists the subtitles for a
//! movie or episode, and downloads them as correctly decoded text.
//!
//! # Modules
//!
//! - `models` - Search items, results, subtitle records
//! - `api` - Ktuvit and Cinemeta clients
//! - `cache` - Resolved-ID cache with TTL
//! - `scrape` - Subtitle listing scraper
//! - `charset` - Charset detection and decoding for downloads
//! - `config` - Endpoints, client options, user config file

pub mod api;
pub mod cache;
pub mod charset;
pub mod config;
pub mod error;
pub mod models;
pub mod scrape;

// Re-export commonly used types
pub use models::{DecodedText, Film, SearchItem, SubtitleRecord, TitleType};

pub use api::{CinemetaClient, KtuvitClient, NameLookup};
pub use cache::{IdCache, MemoryIdCache};
pub use config::{ClientOptions, Config, SiteConfig};
pub use error::{KtuvitError, Result};
