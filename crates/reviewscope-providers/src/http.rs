//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ProviderError;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Transport settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "reviewscope/0.1 (video-discovery)".to_string(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl HttpSettings {
    pub(crate) fn build_client(&self, provider: &'static str) -> Result<Client, ProviderError> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.min(10)))
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|source| ProviderError::Http { provider, source })
    }
}

/// Parse `base_url` and make sure it ends with exactly one slash so that
/// [`Url::join`] appends to it instead of replacing the last segment.
pub(crate) fn normalise_base_url(
    provider: &'static str,
    base_url: &str,
) -> Result<Url, ProviderError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ProviderError::InvalidInput {
        provider,
        reason: format!("invalid base URL '{base_url}': {e}"),
    })
}

pub(crate) fn join(provider: &'static str, base: &Url, path: &str) -> Result<Url, ProviderError> {
    base.join(path).map_err(|e| ProviderError::InvalidInput {
        provider,
        reason: format!("cannot join '{path}' onto '{base}': {e}"),
    })
}

/// Turn a non-2xx response into the matching [`ProviderError`].
pub(crate) async fn check_status(
    provider: &'static str,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return Err(ProviderError::RateLimited {
            provider,
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound {
            provider,
            what: response.url().path().to_string(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::UnexpectedStatus {
        provider,
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

/// Read the body and deserialize it, keeping `context` for error messages.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    context: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(provider, e))?;
    serde_json::from_str(&body).map_err(|source| ProviderError::Deserialize {
        provider,
        context: context.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_exactly_one_trailing_slash() {
        let url = normalise_base_url("test", "https://api.example.com/v3//").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v3/");
        let joined = join("test", &url, "search").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v3/search");
    }

    #[test]
    fn invalid_base_url_is_invalid_input() {
        let err = normalise_base_url("test", "not a url").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { .. }));
    }
}
