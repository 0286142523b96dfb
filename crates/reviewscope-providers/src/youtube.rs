//! Client for the `YouTube` Data API v3.
//!
//! Search is a two-step call: `search.list` for matching video ids, then
//! `videos.list` with `snippet,statistics` for the details. Statistics arrive
//! as decimal strings and are parsed leniently.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ProviderError;
use crate::http::{check_status, join, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const PROVIDER: &str = "youtube";

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// The search API never returns more than this many items per page.
pub const MAX_SEARCH_RESULTS: u32 = 50;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:(?:v|e(?:mbed)?|shorts|live)/|[^/]+/.+/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("valid video id regex")
});

/// Word prepended to the product name in search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPrefix {
    #[default]
    Review,
    Top,
    Unboxing,
    Unbox,
}

impl SearchPrefix {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchPrefix::Review => "review",
            SearchPrefix::Top => "top",
            SearchPrefix::Unboxing => "unboxing",
            SearchPrefix::Unbox => "unbox",
        }
    }
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailSet {
    pub default: Option<String>,
    pub medium: Option<String>,
    pub high: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YouTubeVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnails: ThumbnailSet,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub favorite_count: u64,
    /// `(likes + comments + favorites) / views`, or 0 with no views.
    pub average_interaction: f64,
    pub video_url: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: SnippetThumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct SnippetThumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default, deserialize_with = "lenient_count")]
    view_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    like_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    comment_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    favorite_count: u64,
}

/// Accepts `"123"`, `123` or `null`; anything unparseable counts as 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

impl From<VideoItem> for YouTubeVideo {
    fn from(item: VideoItem) -> Self {
        let stats = item.statistics;
        let interactions = stats.like_count + stats.comment_count + stats.favorite_count;
        #[allow(clippy::cast_precision_loss)]
        let average_interaction = if stats.view_count > 0 {
            interactions as f64 / stats.view_count as f64
        } else {
            0.0
        };
        let thumbs = item.snippet.thumbnails;

        YouTubeVideo {
            video_url: format!("https://www.youtube.com/watch?v={}", item.id),
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnails: ThumbnailSet {
                default: thumbs.default.map(|t| t.url),
                medium: thumbs.medium.map(|t| t.url),
                high: thumbs.high.map(|t| t.url),
            },
            view_count: stats.view_count,
            like_count: stats.like_count,
            comment_count: stats.comment_count,
            favorite_count: stats.favorite_count,
            average_interaction,
        }
    }
}

/// Pull the 11-character video id out of any common `YouTube` URL form.
#[must_use]
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: HttpSettings,
}

impl YouTubeClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, settings: HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidInput`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: settings.build_client(PROVIDER)?,
            api_key: api_key.to_owned(),
            base_url: normalise_base_url(PROVIDER, base_url)?,
            settings,
        })
    }

    /// Searches for videos matching `"<prefix> <keyword>"` and returns them
    /// with statistics. `max_results` is clamped to 1..=50.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if either API call fails or returns an
    /// unexpected body.
    pub async fn search_videos(
        &self,
        keyword: &str,
        max_results: u32,
        prefix: SearchPrefix,
    ) -> Result<Vec<YouTubeVideo>, ProviderError> {
        let query = format!("\"{prefix} {keyword}\"");
        let max_results = max_results.clamp(1, MAX_SEARCH_RESULTS).to_string();

        let url = self.build_url(
            "search",
            &[
                ("part", "snippet"),
                ("type", "video"),
                ("q", &query),
                ("maxResults", &max_results),
            ],
        )?;
        let search: SearchListResponse = self.get_json(&url, "search.list").await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos = self.videos_by_id(&ids.join(",")).await?;
        tracing::debug!(
            provider = PROVIDER,
            keyword,
            count = videos.len(),
            "youtube search complete"
        );
        Ok(videos)
    }

    /// Fetches one video's details from its watch, share, embed or shorts URL.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidInput`] if no video id can be found in `url`.
    /// - [`ProviderError::NotFound`] if the API knows no such video.
    /// - Any transport or decoding error from the API call.
    pub async fn video_info(&self, url: &str) -> Result<YouTubeVideo, ProviderError> {
        let id = extract_video_id(url).ok_or_else(|| ProviderError::InvalidInput {
            provider: PROVIDER,
            reason: format!("no video id in '{url}'"),
        })?;

        self.videos_by_id(&id)
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::NotFound {
                provider: PROVIDER,
                what: format!("video {id}"),
            })
    }

    async fn videos_by_id(&self, ids: &str) -> Result<Vec<YouTubeVideo>, ProviderError> {
        let url = self.build_url("videos", &[("part", "snippet,statistics"), ("id", ids)])?;
        let list: VideoListResponse = self.get_json(&url, "videos.list").await?;
        Ok(list.items.into_iter().map(YouTubeVideo::from).collect())
    }

    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = join(PROVIDER, &self.base_url, endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, ProviderError> {
        let client = &self.client;
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async move {
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
                let response = check_status(PROVIDER, response).await?;
                read_json(PROVIDER, context, response).await
            },
        )
        .await
    }
}
