//! `TikTok` video metadata via the public oEmbed endpoint.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::ProviderError;
use crate::http::{check_status, join, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const PROVIDER: &str = "tiktok";

const DEFAULT_BASE_URL: &str = "https://www.tiktok.com/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TikTokVideo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

pub struct TikTokClient {
    client: Client,
    base_url: Url,
    settings: HttpSettings,
}

impl TikTokClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidInput`] if `base_url` is not a valid URL.
    pub fn with_base_url(settings: HttpSettings, base_url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: settings.build_client(PROVIDER)?,
            base_url: normalise_base_url(PROVIDER, base_url)?,
            settings,
        })
    }

    /// Looks up a video's title and author from its share URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EmptyResponse`] when oEmbed answers without a
    /// title, [`ProviderError::NotFound`] on 404, or any transport error.
    pub async fn video_info(&self, video_url: &str) -> Result<TikTokVideo, ProviderError> {
        let mut url = join(PROVIDER, &self.base_url, "oembed")?;
        url.query_pairs_mut().append_pair("url", video_url);

        let client = &self.client;
        let url = &url;
        let video: TikTokVideo = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async move {
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
                let response = check_status(PROVIDER, response).await?;
                read_json(PROVIDER, "oembed", response).await
            },
        )
        .await?;

        if video.title.trim().is_empty() {
            return Err(ProviderError::EmptyResponse { provider: PROVIDER });
        }
        Ok(video)
    }
}
