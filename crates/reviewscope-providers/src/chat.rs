//! OpenAI-compatible chat completions client, used for both `OpenAI` and
//! `OpenRouter`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;
use crate::http::{check_status, join, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const OPENAI_PROVIDER: &str = "openai";
pub const OPENROUTER_PROVIDER: &str = "openrouter";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    provider: &'static str,
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    settings: HttpSettings,
}

impl ChatCompletionsClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn openai(
        api_key: &str,
        model: &str,
        settings: HttpSettings,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(OPENAI_PROVIDER, api_key, model, settings, OPENAI_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn openrouter(
        api_key: &str,
        model: &str,
        settings: HttpSettings,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(
            OPENROUTER_PROVIDER,
            api_key,
            model,
            settings,
            OPENROUTER_BASE_URL,
        )
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidInput`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        provider: &'static str,
        api_key: &str,
        model: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            provider,
            client: settings.build_client(provider)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: normalise_base_url(provider, base_url)?,
            settings,
        })
    }

    #[must_use]
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::EmptyResponse`] if the first choice has no
    /// content, or any transport or decoding error.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let provider = self.provider;
        let url = join(provider, &self.base_url, "chat/completions")?;
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let client = &self.client;
        let api_key = self.api_key.as_str();
        let (url, body) = (&url, &body);
        let response: ChatResponse = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async move {
                let response = client
                    .post(url.clone())
                    .bearer_auth(api_key)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_reqwest(provider, e))?;
                let response = check_status(provider, response).await?;
                read_json(provider, "chat/completions", response).await
            },
        )
        .await?;

        tracing::debug!(provider, model = %self.model, "chat completion received");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse { provider })
    }
}
