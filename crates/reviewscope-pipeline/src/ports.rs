//! Capabilities the pipeline needs from the outside world, and their
//! implementations over the concrete provider clients and Postgres.

use async_trait::async_trait;
use reviewscope_core::{
    Analysis, AnalysisKey, NewAnalysis, NewVideoCandidate, VideoCandidate, VideoQuery,
};
use reviewscope_db::DbError;
use reviewscope_providers::{
    ChatCompletionsClient, GeminiClient, PageClient, ProviderError, SearchPrefix, TikTokClient,
    YouTubeClient,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::normalize::RawCandidate;

/// Looks up a video page's title from its URL.
#[async_trait]
pub trait VideoMetadata: Send + Sync {
    async fn video_title(&self, url: &str) -> Result<String, ProviderError>;
}

/// A generative-text backend: prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn fetch_title(&self, url: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, keyword: &str, max_results: u32)
        -> Result<Vec<RawCandidate>, ProviderError>;
}

/// Persistence for analyses and their candidates.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DbError>;

    async fn find_analysis(&self, key: &AnalysisKey) -> Result<Option<Analysis>, DbError>;

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, DbError>;

    async fn upsert_analysis(&self, new: &NewAnalysis) -> Result<Analysis, DbError>;

    async fn delete_analysis(&self, id: Uuid) -> Result<(), DbError>;

    async fn insert_candidates(&self, rows: &[NewVideoCandidate]) -> Result<u64, DbError>;

    async fn list_candidates(&self, query: &VideoQuery) -> Result<Vec<VideoCandidate>, DbError>;
}

// ---------------------------------------------------------------------------
// Provider clients
// ---------------------------------------------------------------------------

#[async_trait]
impl VideoMetadata for YouTubeClient {
    async fn video_title(&self, url: &str) -> Result<String, ProviderError> {
        Ok(self.video_info(url).await?.title)
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<RawCandidate>, ProviderError> {
        let videos = self
            .search_videos(keyword, max_results, SearchPrefix::default())
            .await?;
        Ok(videos.into_iter().map(RawCandidate::from).collect())
    }
}

#[async_trait]
impl VideoMetadata for TikTokClient {
    async fn video_title(&self, url: &str) -> Result<String, ProviderError> {
        Ok(self.video_info(url).await?.title)
    }
}

#[async_trait]
impl PageScraper for PageClient {
    async fn fetch_title(&self, url: &str) -> Result<String, ProviderError> {
        PageClient::fetch_title(self, url).await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        reviewscope_providers::gemini::PROVIDER
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate_content(prompt).await
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn name(&self) -> &'static str {
        self.provider()
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        ChatCompletionsClient::complete(self, prompt).await
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

/// [`AnalysisStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn health_check(&self) -> Result<(), DbError> {
        reviewscope_db::health_check(&self.pool).await
    }

    async fn find_analysis(&self, key: &AnalysisKey) -> Result<Option<Analysis>, DbError> {
        reviewscope_db::find_analysis(&self.pool, key).await
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, DbError> {
        reviewscope_db::get_analysis(&self.pool, id).await
    }

    async fn upsert_analysis(&self, new: &NewAnalysis) -> Result<Analysis, DbError> {
        reviewscope_db::upsert_analysis(&self.pool, new).await
    }

    async fn delete_analysis(&self, id: Uuid) -> Result<(), DbError> {
        reviewscope_db::delete_analysis(&self.pool, id).await
    }

    async fn insert_candidates(&self, rows: &[NewVideoCandidate]) -> Result<u64, DbError> {
        reviewscope_db::insert_video_candidates(&self.pool, rows).await
    }

    async fn list_candidates(&self, query: &VideoQuery) -> Result<Vec<VideoCandidate>, DbError> {
        reviewscope_db::list_video_candidates(&self.pool, query).await
    }
}
