use thiserror::Error;

/// Errors returned by the external provider clients.
///
/// Every variant names the provider that failed so callers can log and
/// report it without extra context.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("{provider}: HTTP error: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider}: rate limited (HTTP 429)")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: Option<u64>,
    },

    #[error("{provider}: unexpected HTTP status {status}: {body}")]
    UnexpectedStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("{provider}: JSON deserialization error for {context}: {source}")]
    Deserialize {
        provider: &'static str,
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider}: response contained no usable content")]
    EmptyResponse { provider: &'static str },

    #[error("{provider}: invalid input: {reason}")]
    InvalidInput {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider}: not found: {what}")]
    NotFound {
        provider: &'static str,
        what: String,
    },
}

impl ProviderError {
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Http { provider, .. }
            | ProviderError::Timeout { provider }
            | ProviderError::RateLimited { provider, .. }
            | ProviderError::UnexpectedStatus { provider, .. }
            | ProviderError::Deserialize { provider, .. }
            | ProviderError::EmptyResponse { provider }
            | ProviderError::InvalidInput { provider, .. }
            | ProviderError::NotFound { provider, .. } => *provider,
        }
    }

    /// Wrap a `reqwest` error, splitting out timeouts.
    ///
    /// The request URL is dropped: `YouTube` requests carry the API key in
    /// the query string and these errors end up in logs.
    pub(crate) fn from_reqwest(provider: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Http {
                provider,
                source: source.without_url(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_reports_its_provider() {
        let errors = [
            ProviderError::Timeout { provider: "gemini" },
            ProviderError::RateLimited {
                provider: "gemini",
                retry_after_secs: Some(3),
            },
            ProviderError::UnexpectedStatus {
                provider: "gemini",
                status: 502,
                body: String::new(),
            },
            ProviderError::EmptyResponse { provider: "gemini" },
            ProviderError::InvalidInput {
                provider: "gemini",
                reason: "x".to_string(),
            },
            ProviderError::NotFound {
                provider: "gemini",
                what: "x".to_string(),
            },
        ];
        for err in &errors {
            assert_eq!(err.provider(), "gemini");
            assert!(err.to_string().starts_with("gemini: "), "{err}");
        }
    }
}
