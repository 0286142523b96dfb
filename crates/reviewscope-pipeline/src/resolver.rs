//! Product name resolution.
//!
//! A raw name comes from the input itself: a video title for `YouTube` and
//! `TikTok` links, the page title for other URLs (with a model trace as the
//! fallback), or the text verbatim. The raw name is then cleaned by the
//! primary model.

use std::sync::Arc;

use reviewscope_core::InputType;

use crate::error::ResolutionError;
use crate::llm_json::{extract_json_block, required_string};
use crate::ports::{PageScraper, TextGenerator, VideoMetadata};
use crate::prompts::{clean_name_prompt, trace_product_prompt};

/// Result of the cleaning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanedName {
    Clean(String),
    /// The model answered but not with a usable `{"name": ...}`. Stored as
    /// an empty product name; the raw name is never substituted.
    Degraded,
}

impl CleanedName {
    #[must_use]
    pub fn as_product_name(&self) -> &str {
        match self {
            CleanedName::Clean(name) => name,
            CleanedName::Degraded => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub raw: String,
    pub cleaned: CleanedName,
}

pub struct ProductNameResolver {
    youtube: Arc<dyn VideoMetadata>,
    tiktok: Arc<dyn VideoMetadata>,
    pages: Arc<dyn PageScraper>,
    llm: Arc<dyn TextGenerator>,
}

impl ProductNameResolver {
    pub fn new(
        youtube: Arc<dyn VideoMetadata>,
        tiktok: Arc<dyn VideoMetadata>,
        pages: Arc<dyn PageScraper>,
        llm: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            youtube,
            tiktok,
            pages,
            llm,
        }
    }

    /// Derive and clean a product name for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the raw name cannot be obtained, or
    /// when the cleaning call itself fails at the provider. An unparseable
    /// cleaning answer is not an error; it yields [`CleanedName::Degraded`].
    pub async fn resolve(
        &self,
        input: &str,
        input_type: InputType,
    ) -> Result<ResolvedName, ResolutionError> {
        if input.trim().is_empty() {
            return Err(ResolutionError::EmptyInput);
        }

        let raw = self.raw_name(input, input_type).await?;
        if raw.trim().is_empty() {
            return Err(ResolutionError::EmptyName { input_type });
        }

        let cleaned = self.clean(&raw).await?;
        Ok(ResolvedName { raw, cleaned })
    }

    async fn raw_name(
        &self,
        input: &str,
        input_type: InputType,
    ) -> Result<String, ResolutionError> {
        match input_type {
            InputType::Youtube => Ok(self.youtube.video_title(input).await?),
            InputType::Tiktok => Ok(self.tiktok.video_title(input).await?),
            InputType::Website => match self.pages.fetch_title(input).await {
                Ok(title) => Ok(title),
                Err(e) => {
                    tracing::info!(
                        provider = e.provider(),
                        error = %e,
                        "page title scrape failed, tracing product with model"
                    );
                    self.trace_product(input).await
                }
            },
            InputType::Text => Ok(input.to_string()),
        }
    }

    async fn trace_product(&self, url: &str) -> Result<String, ResolutionError> {
        let text = self.llm.complete(&trace_product_prompt(url)).await?;
        let value = extract_json_block(&text)?;
        Ok(required_string(&value, "productName")?)
    }

    async fn clean(&self, raw: &str) -> Result<CleanedName, ResolutionError> {
        let text = self.llm.complete(&clean_name_prompt(raw)).await?;

        match extract_json_block(&text).and_then(|value| required_string(&value, "name")) {
            Ok(name) => Ok(CleanedName::Clean(name)),
            Err(e) => {
                tracing::warn!(
                    provider = self.llm.name(),
                    error = %e,
                    "product name cleaning returned no usable name"
                );
                Ok(CleanedName::Degraded)
            }
        }
    }
}
