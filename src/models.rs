//! Data structures shared across the client
//!
//! - **Search**: what the caller asks for and what Ktuvit returns
//! - **Subtitles**: rows scraped from the listing pages
//! - **Download**: decoded subtitle text

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// =============================================================================
// Search Models
// =============================================================================

/// Title kind used to narrow a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Movie,
    Series,
}

impl TitleType {
    /// Ktuvit's `SearchType` discriminator
    pub fn search_type(self) -> &'static str {
        match self {
            TitleType::Movie => "0",
            TitleType::Series => "1",
        }
    }
}

impl fmt::Display for TitleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleType::Movie => write!(f, "Movie"),
            TitleType::Series => write!(f, "Series"),
        }
    }
}

/// Search parameters for a title.
///
/// In practice only `name`, `title_type`, `year` and `with_subs_only` narrow
/// results usefully; the other filters are passed through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub name: Option<String>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    /// Release year or series range ("2019–2021")
    pub year: Option<String>,
    #[serde(default)]
    pub rating: Vec<String>,
    pub title_type: Option<TitleType>,
    #[serde(default)]
    pub with_subs_only: bool,
}

impl SearchItem {
    /// Item identified by IMDB ID only; the name is looked up on resolve
    pub fn by_imdb(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: Some(imdb_id.into()),
            ..Default::default()
        }
    }

    /// Item identified by name only (search, not resolvable)
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, title_type: TitleType) -> Self {
        self.title_type = Some(title_type);
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Year with any range suffix ("2019–2021" -> "2019") stripped
    pub fn normalized_year(&self) -> String {
        self.year
            .as_deref()
            .and_then(|y| y.split('–').next())
            .map(|y| y.trim().to_string())
            .unwrap_or_default()
    }
}

/// One title in Ktuvit's search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    /// Ktuvit's internal title ID
    #[serde(rename = "ID", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "ImdbID", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "HebName", default)]
    pub heb_name: Option<String>,
    #[serde(rename = "EngName", default)]
    pub eng_name: Option<String>,
}

impl Film {
    /// Whether this entry's IMDB field contains `imdb_id`.
    ///
    /// Containment, not equality: the remote field is not always formatted
    /// exactly like the caller's ID. A short ID can match a longer one.
    pub fn matches_imdb(&self, imdb_id: &str) -> bool {
        self.imdb_id
            .as_deref()
            .map(|remote| remote.contains(imdb_id))
            .unwrap_or(false)
    }
}

impl fmt::Display for Film {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .eng_name
            .as_deref()
            .or(self.heb_name.as_deref())
            .unwrap_or("?");
        write!(f, "{} [{}]", name, self.id)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

// =============================================================================
// Subtitle Models
// =============================================================================

/// One row of a Ktuvit subtitle listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Release / file name as displayed
    pub name: String,
    /// Ktuvit subtitle ID (needed for download)
    pub id: String,
    pub credit: String,
    /// `None` when the page shows something that isn't a number
    pub downloads: Option<u64>,
    /// `None` when the page date is malformed
    pub upload_date: Option<NaiveDate>,
    pub size: String,
    pub file_type: String,
}

impl fmt::Display for SubtitleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let downloads = self
            .downloads
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} ({}, {}) - {}⬇ by {}",
            self.name, self.file_type, self.size, downloads, self.credit
        )
    }
}

// =============================================================================
// Download Models
// =============================================================================

/// Subtitle body decoded to text, with the encoding that was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

// =============================================================================
// Tests
// =============================================================================
