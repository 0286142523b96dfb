//! In-memory stand-ins for the ports, shared by the unit tests.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reviewscope_core::{
    Analysis, AnalysisKey, NewAnalysis, NewVideoCandidate, SortDirection, SortField, SortKey,
    VideoCandidate, VideoQuery,
};
use reviewscope_db::DbError;
use reviewscope_providers::ProviderError;
use serde_json::json;
use uuid::Uuid;

use crate::normalize::RawCandidate;
use crate::ports::{AnalysisStore, PageScraper, TextGenerator, VideoMetadata, VideoSearch};

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Replies in script order, repeating the last reply once exhausted.
pub struct FakeLlm {
    name: &'static str,
    replies: Vec<Reply>,
    delay: Option<Duration>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeLlm {
    pub fn replying(name: &'static str, text: &str) -> Self {
        Self::script(name, vec![Reply::Text(text.to_string())])
    }

    pub fn failing(name: &'static str) -> Self {
        Self::script(name, vec![Reply::Fail])
    }

    /// `None` entries fail; `Some` entries reply with the text.
    pub fn sequence(name: &'static str, replies: &[Option<&str>]) -> Self {
        Self::script(
            name,
            replies
                .iter()
                .map(|r| r.map_or(Reply::Fail, |t| Reply::Text(t.to_string())))
                .collect(),
        )
    }

    fn script(name: &'static str, replies: Vec<Reply>) -> Self {
        Self {
            name,
            replies,
            delay: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl TextGenerator for FakeLlm {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or(Reply::Fail);
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(ProviderError::Timeout {
                provider: self.name,
            }),
        }
    }
}

pub struct FakeSearch {
    titles: Option<Vec<String>>,
    calls: Arc<Mutex<Vec<(String, u32)>>>,
}

impl FakeSearch {
    pub fn titles(titles: &[&str]) -> Self {
        Self {
            titles: Some(titles.iter().map(ToString::to_string).collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            titles: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(String, u32)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl VideoSearch for FakeSearch {
    async fn search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<RawCandidate>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((keyword.to_string(), max_results));
        let Some(titles) = &self.titles else {
            return Err(ProviderError::UnexpectedStatus {
                provider: "youtube",
                status: 403,
                body: "quotaExceeded".to_string(),
            });
        };
        Ok(titles
            .iter()
            .enumerate()
            .map(|(i, title)| RawCandidate {
                title: json!(title),
                video_url: json!(format!("https://www.youtube.com/watch?v=vid{i:08}")),
                thumbnails: json!({"default": "d.jpg", "high": "h.jpg"}),
                view_count: json!(1000),
                like_count: json!(40),
                average_interaction: Some(0.04),
                ..RawCandidate::default()
            })
            .collect())
    }
}

/// Video metadata with a fixed title, or a not-found failure.
pub struct FakeMetadata {
    provider: &'static str,
    title: Option<String>,
}

impl FakeMetadata {
    pub fn titled(provider: &'static str, title: &str) -> Self {
        Self {
            provider,
            title: Some(title.to_string()),
        }
    }

    pub fn missing(provider: &'static str) -> Self {
        Self {
            provider,
            title: None,
        }
    }
}

#[async_trait]
impl VideoMetadata for FakeMetadata {
    async fn video_title(&self, url: &str) -> Result<String, ProviderError> {
        self.title.clone().ok_or_else(|| ProviderError::NotFound {
            provider: self.provider,
            what: url.to_string(),
        })
    }
}

pub struct FakePages {
    title: Option<String>,
}

impl FakePages {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
        }
    }

    pub fn broken() -> Self {
        Self { title: None }
    }
}

#[async_trait]
impl PageScraper for FakePages {
    async fn fetch_title(&self, _url: &str) -> Result<String, ProviderError> {
        self.title.clone().ok_or(ProviderError::UnexpectedStatus {
            provider: "website",
            status: 503,
            body: String::new(),
        })
    }
}

#[derive(Default)]
struct MemoryState {
    analyses: Vec<Analysis>,
    candidates: Vec<NewVideoCandidate>,
    upserts: usize,
}

/// Store backed by vectors. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn analyses(&self) -> Vec<Analysis> {
        self.state.lock().unwrap().analyses.clone()
    }

    pub fn candidates(&self) -> Vec<NewVideoCandidate> {
        self.state.lock().unwrap().candidates.clone()
    }

    pub fn upserts(&self) -> usize {
        self.state.lock().unwrap().upserts
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn find_analysis(&self, key: &AnalysisKey) -> Result<Option<Analysis>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state.analyses.iter().find(|a| &a.key() == key).cloned())
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, DbError> {
        let state = self.state.lock().unwrap();
        Ok(state.analyses.iter().find(|a| a.id == id).cloned())
    }

    async fn upsert_analysis(&self, new: &NewAnalysis) -> Result<Analysis, DbError> {
        let mut state = self.state.lock().unwrap();
        state.upserts += 1;
        let key = AnalysisKey {
            input: new.input.clone(),
            locale: new.locale,
            model: new.model,
        };
        if let Some(existing) = state.analyses.iter_mut().find(|a| a.key() == key) {
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let analysis = Analysis {
            id: Uuid::new_v4(),
            input: new.input.clone(),
            input_type: new.input_type,
            product_name: new.product_name.clone(),
            locale: new.locale,
            model: new.model,
            created_at: now,
            updated_at: now,
        };
        state.analyses.push(analysis.clone());
        Ok(analysis)
    }

    async fn delete_analysis(&self, id: Uuid) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        let before = state.analyses.len();
        state.analyses.retain(|a| a.id != id);
        if state.analyses.len() == before {
            return Err(DbError::NotFound);
        }
        state.candidates.retain(|c| c.analysis_id != id);
        Ok(())
    }

    async fn insert_candidates(&self, rows: &[NewVideoCandidate]) -> Result<u64, DbError> {
        let mut state = self.state.lock().unwrap();
        state.candidates.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn list_candidates(&self, query: &VideoQuery) -> Result<Vec<VideoCandidate>, DbError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<&NewVideoCandidate> = state
            .candidates
            .iter()
            .filter(|c| c.raw_input == query.input || c.product_name == query.input)
            .filter(|c| c.analysis_id == query.analysis_id)
            .filter(|c| query.locale.is_none() || c.locale == query.locale)
            .collect();
        // Stable, so ties keep insertion order like the `seq` tie-break.
        matching.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| compare_by(key, a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(matching
            .into_iter()
            .map(|c| VideoCandidate {
                id: Uuid::new_v4(),
                analysis_id: c.analysis_id,
                product_name: c.product_name.clone(),
                raw_input: c.raw_input.clone(),
                input_search_type: c.input_search_type,
                locale: c.locale,
                model: c.model,
                discovery_source: c.discovery_source,
                title: c.title.clone(),
                description: c.description.clone(),
                video_url: c.video_url.clone(),
                thumbnails: c.thumbnails.clone(),
                view_count: c.view_count,
                like_count: c.like_count,
                comment_count: c.comment_count,
                favorite_count: c.favorite_count,
                average_interaction: c.average_interaction,
                created_at: Utc::now(),
            })
            .collect())
    }
}

/// Same ordering as the SQL listing: nulls sort last in either direction.
fn compare_by(key: &SortKey, a: &NewVideoCandidate, b: &NewVideoCandidate) -> Ordering {
    let ordering = match key.field {
        SortField::ViewCount => a.view_count.cmp(&b.view_count),
        SortField::LikeCount => a.like_count.cmp(&b.like_count),
        SortField::CommentCount => a.comment_count.cmp(&b.comment_count),
        SortField::FavoriteCount => a.favorite_count.cmp(&b.favorite_count),
        SortField::AverageInteraction => {
            match (a.average_interaction, b.average_interaction) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    };
    match key.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
