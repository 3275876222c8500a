//! Ktuvit.me client
//!
//! Every call carries the user's `Login` cookie. Flow:
//! 1. [`KtuvitClient::resolve`] turns an IMDB ID into Ktuvit's title ID
//! 2. [`KtuvitClient::subtitles_for_movie`] / [`KtuvitClient::subtitles_for_episode`]
//!    scrape the subtitle listing
//! 3. [`KtuvitClient::download_subtitle`] trades (title, subtitle) for a one-time
//!    token and fetches the file, decoding it with charset detection
//!
//! No retries happen here; transport errors go straight back to the caller.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, SET_COOKIE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::cinemeta::{CinemetaClient, NameLookup};
use crate::cache::{IdCache, MemoryIdCache, NoCache};
use crate::charset::{decode_stream, StreamDecoder};
use crate::config::{ClientOptions, SiteConfig};
use crate::error::{KtuvitError, Result};
use crate::models::{DecodedText, Film, SearchItem, SubtitleRecord};
use crate::scrape::extract_subtitles;

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";

// =============================================================================
// Wire types
// =============================================================================

/// Every POST body is wrapped as `{"request": ...}`
#[derive(Debug, Serialize)]
struct RequestEnvelope<'a, T: Serialize> {
    request: &'a T,
}

/// Every JSON reply is `{"d": "<json encoded as a string>"}`
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    d: Option<String>,
}

/// Body of the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchQuery {
    pub film_name: String,
    pub actors: Vec<String>,
    pub studios: Option<Vec<String>>,
    pub directors: Vec<String>,
    pub genres: Vec<String>,
    pub countries: Vec<String>,
    pub languages: Vec<String>,
    pub year: String,
    pub rating: Vec<String>,
    pub page: u32,
    /// "-1" any, "0" movie, "1" series
    pub search_type: String,
    pub with_subs_only: bool,
}

impl From<&SearchItem> for SearchQuery {
    fn from(item: &SearchItem) -> Self {
        Self {
            film_name: item.name.clone().unwrap_or_default(),
            actors: item.actors.clone(),
            studios: None,
            directors: item.directors.clone(),
            genres: item.genres.clone(),
            countries: item.countries.clone(),
            languages: item.languages.clone(),
            year: item.normalized_year(),
            rating: item.rating.clone(),
            page: 1,
            search_type: item
                .title_type
                .map(|t| t.search_type())
                .unwrap_or("-1")
                .to_string(),
            with_subs_only: item.with_subs_only,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,
    #[serde(rename = "Films", default)]
    films: Option<Vec<Film>>,
}

#[derive(Debug, Serialize)]
struct DownloadTokenRequest<'a> {
    #[serde(rename = "FilmID")]
    film_id: &'a str,
    #[serde(rename = "SubtitleID")]
    subtitle_id: &'a str,
    #[serde(rename = "FontSize")]
    font_size: u32,
    #[serde(rename = "FontColor")]
    font_color: &'a str,
    #[serde(rename = "PredefinedLayout")]
    predefined_layout: i32,
}

#[derive(Debug, Deserialize)]
struct DownloadTokenPayload {
    #[serde(rename = "DownloadIdentifier", default)]
    download_identifier: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// One-time download identifier. Consumed by [`KtuvitClient::fetch_subtitle`].
#[derive(Debug, PartialEq, Eq)]
pub struct DownloadToken(String);

impl DownloadToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Client
// =============================================================================

/// Ktuvit API client
pub struct KtuvitClient {
    site: SiteConfig,
    options: ClientOptions,
    client: reqwest::Client,
    headers: HeaderMap,
    cache: Arc<dyn IdCache>,
    names: Arc<dyn NameLookup>,
}

impl KtuvitClient {
    /// Client for www.ktuvit.me with default options
    pub fn new(login_cookie: &str) -> Result<Self> {
        Self::with_site(login_cookie, SiteConfig::default(), ClientOptions::default())
    }

    /// Client with explicit endpoints and options (also used for testing)
    pub fn with_site(login_cookie: &str, site: SiteConfig, options: ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("Login={}", login_cookie))
                .map_err(|_| KtuvitError::Parse("login cookie is not a valid header value".into()))?,
        );

        let cache: Arc<dyn IdCache> = if options.cache_enabled {
            Arc::new(MemoryIdCache::new())
        } else {
            Arc::new(NoCache)
        };

        Ok(Self {
            site,
            options,
            client: http_client()?,
            headers,
            cache,
            names: Arc::new(CinemetaClient::new()),
        })
    }

    /// Replace the IMDB name lookup
    pub fn with_name_lookup(mut self, names: Arc<dyn NameLookup>) -> Self {
        self.names = names;
        self
    }

    /// Replace the ID cache store. Ignored when caching is disabled.
    pub fn with_cache(mut self, cache: Arc<dyn IdCache>) -> Self {
        if self.options.cache_enabled {
            self.cache = cache;
        }
        self
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Exchange credentials for the `Login` cookie value.
    ///
    /// `hashed_password` is the hash the site's login form sends, not the
    /// plain password. Whether the cookie actually works is not checked.
    pub async fn login(site: &SiteConfig, email: &str, hashed_password: &str) -> Result<String> {
        let body = RequestEnvelope {
            request: &LoginRequest {
                email,
                password: hashed_password,
            },
        };

        let response = http_client()?
            .post(site.login_url())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response)?;

        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .filter_map(|pair| pair.trim().strip_prefix("Login="))
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or(KtuvitError::LoginFailed)
    }

    // -------------------------------------------------------------------------
    // Search & resolution
    // -------------------------------------------------------------------------

    /// Run a title search
    pub async fn search(&self, item: &SearchItem) -> Result<Vec<Film>> {
        let query = SearchQuery::from(item);
        debug!(
            name = %query.film_name,
            year = %query.year,
            search_type = %query.search_type,
            "ktuvit search"
        );

        let payload = self.post_request(&self.site.search_url(), &query).await?;
        let parsed: SearchPayload = serde_json::from_str(&payload)?;

        match parsed.error_message.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => {
                warn!(?query, "search rejected: {}", msg);
                Err(KtuvitError::SearchRejected(msg.to_string()))
            }
            _ => Ok(parsed.films.unwrap_or_default()),
        }
    }

    /// Resolve the Ktuvit title ID for `item.imdb_id`.
    ///
    /// Returns `Ok(None)` when the search has no matching entry. Only hits
    /// are cached; misses always go back to the site.
    pub async fn resolve(&self, item: &SearchItem) -> Result<Option<String>> {
        let imdb_id = item
            .imdb_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(KtuvitError::MissingCatalogId)?;

        if let Some(ktuvit_id) = self.cache.get(imdb_id).await {
            return Ok(Some(ktuvit_id));
        }

        let name = match item.name.clone() {
            Some(name) => Some(name),
            None => match self.names.name_for(imdb_id).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(imdb_id, "name lookup failed: {}", e);
                    None
                }
            },
        };
        let name = name.ok_or_else(|| KtuvitError::NameUnavailable(imdb_id.to_string()))?;

        let item = SearchItem {
            name: Some(name),
            ..item.clone()
        };
        let films = self.search(&item).await?;

        let found = find_id_in_results(&films, imdb_id);
        match &found {
            Some(ktuvit_id) => {
                debug!(imdb_id, ktuvit_id = %ktuvit_id, "resolved ktuvit id");
                self.cache.put(imdb_id, ktuvit_id).await;
            }
            None => debug!(imdb_id, results = films.len(), "no ktuvit match"),
        }

        Ok(found)
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// Subtitles listed on a movie page
    pub async fn subtitles_for_movie(&self, ktuvit_id: &str) -> Result<Vec<SubtitleRecord>> {
        let html = self.get_text(&self.site.movie_info_url(ktuvit_id)).await?;
        extract_subtitles(&html)
    }

    /// Subtitles for one episode of a series
    pub async fn subtitles_for_episode(
        &self,
        ktuvit_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Vec<SubtitleRecord>> {
        let url = self.site.episode_info_url(ktuvit_id, season, episode);
        let html = self.get_text(&url).await?;
        extract_subtitles(&html)
    }

    // -------------------------------------------------------------------------
    // Download
    // -------------------------------------------------------------------------

    /// Step 1: trade (title, subtitle) for a one-time download token
    pub async fn request_download_token(
        &self,
        ktuvit_id: &str,
        subtitle_id: &str,
    ) -> Result<DownloadToken> {
        let request = DownloadTokenRequest {
            film_id: ktuvit_id,
            subtitle_id,
            font_size: 0,
            font_color: "",
            predefined_layout: -1,
        };

        let payload = self
            .post_request(&self.site.download_token_url(), &request)
            .await?;
        let parsed: DownloadTokenPayload = serde_json::from_str(&payload)?;

        parsed
            .download_identifier
            .filter(|t| !t.trim().is_empty())
            .map(DownloadToken)
            .ok_or(KtuvitError::MissingToken)
    }

    /// Step 2: fetch the file behind `token` and decode it
    pub async fn fetch_subtitle(&self, token: DownloadToken) -> Result<DecodedText> {
        let decoder = StreamDecoder::new(&self.options.fallback_encoding, self.options.sample_limit)?;

        let response = self
            .client
            .get(self.site.download_url(token.as_str()))
            .headers(self.headers.clone())
            .send()
            .await?;
        let response = check_status(response)?;

        decode_stream(response.bytes_stream(), decoder).await
    }

    /// Download a subtitle as text
    pub async fn download_subtitle(&self, ktuvit_id: &str, subtitle_id: &str) -> Result<DecodedText> {
        let token = self.request_download_token(ktuvit_id, subtitle_id).await?;
        self.fetch_subtitle(token).await
    }

    /// Callback flavour of [`Self::download_subtitle`].
    ///
    /// A failed token exchange returns `Err` and `on_complete` is never called.
    /// Once a token exists, the fetch outcome (text or error) goes to `on_complete`.
    pub async fn download_subtitle_with<F>(
        &self,
        ktuvit_id: &str,
        subtitle_id: &str,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(Result<DecodedText>),
    {
        let token = self.request_download_token(ktuvit_id, subtitle_id).await?;
        on_complete(self.fetch_subtitle(token).await);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Transport helpers
    // -------------------------------------------------------------------------

    /// POST `{"request": data}` and return the unwrapped `d` payload
    async fn post_request<T: Serialize>(&self, url: &str, data: &T) -> Result<String> {
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(&RequestEnvelope { request: data })
            .send()
            .await?;
        let response = check_status(response)?;

        let body = response.text().await?;
        let envelope: ResponseEnvelope = serde_json::from_str(&body)?;
        envelope
            .d
            .ok_or_else(|| KtuvitError::Parse("response envelope has no `d` field".into()))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(%url, "ktuvit get");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        let response = check_status(response)?;
        Ok(response.text().await?)
    }
}

/// First entry (in result order) whose IMDB field contains `imdb_id`
pub fn find_id_in_results(films: &[Film], imdb_id: &str) -> Option<String> {
    films
        .iter()
        .find(|f| f.matches_imdb(imdb_id))
        .map(|f| f.id.clone())
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(KtuvitError::Status(status.as_u16()))
    }
}
