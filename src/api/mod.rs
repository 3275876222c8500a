//! API clients for external services
//!
//! - Ktuvit: title search, subtitle listings and downloads
//! - Cinemeta: IMDB ID to title name lookup

pub mod cinemeta;
pub mod ktuvit;

pub use cinemeta::{CinemetaClient, NameLookup};
pub use ktuvit::{DownloadToken, KtuvitClient, SearchQuery};
