//! Building a production [`AnalysisService`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use reviewscope_core::{AppConfig, SecondaryLlm};
use reviewscope_providers::{
    ChatCompletionsClient, GeminiClient, HttpSettings, PageClient, ProviderError, TikTokClient,
    YouTubeClient,
};
use sqlx::PgPool;

use crate::discovery::DiscoveryOrchestrator;
use crate::ports::{PgStore, TextGenerator};
use crate::resolver::ProductNameResolver;
use crate::service::AnalysisService;

#[must_use]
pub fn http_settings(config: &AppConfig) -> HttpSettings {
    HttpSettings {
        timeout_secs: config.provider_timeout_secs,
        user_agent: config.user_agent.clone(),
        max_retries: config.provider_max_retries,
        backoff_base_ms: config.provider_backoff_base_ms,
    }
}

/// Construct every provider client once and wire them into a service.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if an HTTP client cannot be built.
pub fn build_service(config: &AppConfig, pool: PgPool) -> Result<AnalysisService, ProviderError> {
    let settings = http_settings(config);

    let youtube = Arc::new(YouTubeClient::new(&config.youtube_api_key, settings.clone())?);
    let tiktok = Arc::new(TikTokClient::new(settings.clone())?);
    let pages = Arc::new(PageClient::new(settings.clone())?);
    let gemini = GeminiClient::new(&config.gemini_api_key, &config.gemini_model, settings.clone())?;
    let secondary = match config.secondary_llm {
        SecondaryLlm::OpenAi => ChatCompletionsClient::openai(
            &config.secondary_api_key,
            &config.secondary_model,
            settings,
        )?,
        SecondaryLlm::OpenRouter => ChatCompletionsClient::openrouter(
            &config.secondary_api_key,
            &config.secondary_model,
            settings,
        )?,
    };

    tracing::info!(
        primary = reviewscope_providers::gemini::PROVIDER,
        primary_model = gemini.model(),
        secondary = secondary.provider(),
        secondary_model = secondary.model(),
        youtube_max_results = config.youtube_max_results,
        "provider clients ready"
    );

    let gemini: Arc<dyn TextGenerator> = Arc::new(gemini);
    let resolver = ProductNameResolver::new(youtube.clone(), tiktok, pages, Arc::clone(&gemini));
    let discovery = DiscoveryOrchestrator::new(
        youtube,
        gemini,
        Arc::new(secondary),
        config.youtube_max_results,
        Duration::from_secs(config.discovery_branch_timeout_secs),
    );

    Ok(AnalysisService::new(
        Arc::new(PgStore::new(pool)),
        resolver,
        discovery,
    ))
}
