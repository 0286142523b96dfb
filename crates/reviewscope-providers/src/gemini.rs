//! Gemini `generateContent` client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;
use crate::http::{check_status, join, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const PROVIDER: &str = "gemini";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    settings: HttpSettings,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, settings: HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, model, settings, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidInput`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: settings.build_client(PROVIDER)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: normalise_base_url(PROVIDER, base_url)?,
            settings,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a single-turn prompt and returns the text of the first candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EmptyResponse`] if no candidate carries text,
    /// or any transport or decoding error.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = join(
            PROVIDER,
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        )?;
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let (url, body) = (&url, &body);
        let response: GenerateResponse = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async move {
                let response = client
                    .post(url.clone())
                    .header("x-goog-api-key", api_key)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
                let response = check_status(PROVIDER, response).await?;
                read_json(PROVIDER, "generateContent", response).await
            },
        )
        .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse { provider: PROVIDER });
        }
        Ok(text)
    }
}
