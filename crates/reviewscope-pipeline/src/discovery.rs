//! Video discovery fan-out.
//!
//! Three strategies run concurrently for one product name:
//!
//! 1. `YouTube` search. Always runs; its failure fails the whole call.
//! 2. The primary model asked for `YouTube` reviews. Skipped for `TikTok`
//!    input, where it yields nothing.
//! 3. The secondary model asked for `TikTok` reviews, whatever the input type.
//!
//! Branches 2 and 3 never fail the call: a provider, parse, or timeout error
//! is logged and recorded as [`BranchOutcome::Failed`]. Each branch runs
//! under its own time budget. Results are concatenated in strategy order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reviewscope_core::{DiscoverySource, InputType, Locale};
use serde::Serialize;

use crate::error::BranchError;
use crate::llm_json::extract_json_block;
use crate::normalize::{parse_products, RawCandidate};
use crate::ports::{TextGenerator, VideoSearch};
use crate::prompts::{discovery_prompt, VideoPlatform};

#[derive(Debug)]
pub enum BranchOutcome {
    Found {
        source: DiscoverySource,
        items: Vec<RawCandidate>,
    },
    Empty {
        source: DiscoverySource,
    },
    Failed {
        source: DiscoverySource,
        error: BranchError,
    },
}

impl BranchOutcome {
    fn from_items(source: DiscoverySource, items: Vec<RawCandidate>) -> Self {
        if items.is_empty() {
            BranchOutcome::Empty { source }
        } else {
            BranchOutcome::Found { source, items }
        }
    }

    #[must_use]
    pub fn source(&self) -> DiscoverySource {
        match self {
            BranchOutcome::Found { source, .. }
            | BranchOutcome::Empty { source }
            | BranchOutcome::Failed { source, .. } => *source,
        }
    }

    #[must_use]
    pub fn summary(&self) -> BranchSummary {
        let (status, count, error) = match self {
            BranchOutcome::Found { items, .. } => (BranchStatus::Found, items.len(), None),
            BranchOutcome::Empty { .. } => (BranchStatus::Empty, 0, None),
            BranchOutcome::Failed { error, .. } => {
                (BranchStatus::Failed, 0, Some(error.to_string()))
            }
        };
        BranchSummary {
            source: self.source(),
            status,
            count,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Found,
    Empty,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSummary {
    pub source: DiscoverySource,
    pub status: BranchStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// All three branch outcomes, in strategy order.
#[derive(Debug)]
pub struct Discovery {
    pub branches: Vec<BranchOutcome>,
}

impl Discovery {
    /// Every discovered item tagged with its source, strategy 1 first.
    #[must_use]
    pub fn candidates(&self) -> Vec<(DiscoverySource, &RawCandidate)> {
        self.branches
            .iter()
            .filter_map(|branch| match branch {
                BranchOutcome::Found { source, items } => Some((*source, items)),
                _ => None,
            })
            .flat_map(|(source, items)| items.iter().map(move |item| (source, item)))
            .collect()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<BranchSummary> {
        self.branches.iter().map(BranchOutcome::summary).collect()
    }
}

pub struct DiscoveryOrchestrator {
    search: Arc<dyn VideoSearch>,
    primary: Arc<dyn TextGenerator>,
    secondary: Arc<dyn TextGenerator>,
    max_results: u32,
    branch_timeout: Duration,
}

impl DiscoveryOrchestrator {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        primary: Arc<dyn TextGenerator>,
        secondary: Arc<dyn TextGenerator>,
        max_results: u32,
        branch_timeout: Duration,
    ) -> Self {
        Self {
            search,
            primary,
            secondary,
            max_results,
            branch_timeout,
        }
    }

    /// Run all strategies for `product_name`.
    ///
    /// # Errors
    ///
    /// Returns the search branch's [`BranchError`] if `YouTube` search fails
    /// or times out. Model branch failures are recorded, not returned.
    pub async fn discover(
        &self,
        product_name: &str,
        input_type: InputType,
        locale: Option<Locale>,
    ) -> Result<Discovery, BranchError> {
        let (search, primary, secondary) = tokio::join!(
            self.search_branch(product_name),
            self.primary_branch(product_name, input_type, locale),
            self.secondary_branch(product_name, locale),
        );

        let search = search?;
        tracing::debug!(
            product_name,
            count = search.len(),
            "youtube search branch complete"
        );

        Ok(Discovery {
            branches: vec![
                BranchOutcome::from_items(DiscoverySource::YoutubeSearch, search),
                primary,
                secondary,
            ],
        })
    }

    async fn search_branch(&self, product_name: &str) -> Result<Vec<RawCandidate>, BranchError> {
        with_budget(self.branch_timeout, async {
            self.search
                .search(product_name, self.max_results)
                .await
                .map_err(BranchError::from)
        })
        .await
    }

    async fn primary_branch(
        &self,
        product_name: &str,
        input_type: InputType,
        locale: Option<Locale>,
    ) -> BranchOutcome {
        let source = DiscoverySource::PrimaryLlm;
        if input_type == InputType::Tiktok {
            tracing::debug!(strategy = %source, "tiktok input; primary model branch skipped");
            return BranchOutcome::Empty { source };
        }
        let prompt = discovery_prompt(VideoPlatform::YouTube, product_name, locale);
        self.model_branch(source, self.primary.as_ref(), &prompt).await
    }

    async fn secondary_branch(&self, product_name: &str, locale: Option<Locale>) -> BranchOutcome {
        let prompt = discovery_prompt(VideoPlatform::TikTok, product_name, locale);
        self.model_branch(DiscoverySource::SecondaryLlm, self.secondary.as_ref(), &prompt)
            .await
    }

    async fn model_branch(
        &self,
        source: DiscoverySource,
        llm: &dyn TextGenerator,
        prompt: &str,
    ) -> BranchOutcome {
        let result = with_budget(self.branch_timeout, async {
            let text = llm.complete(prompt).await?;
            let value = extract_json_block(&text)?;
            Ok::<_, BranchError>(parse_products(value)?)
        })
        .await;

        match result {
            Ok(items) => {
                tracing::debug!(
                    strategy = %source,
                    provider = llm.name(),
                    count = items.len(),
                    "model branch complete"
                );
                BranchOutcome::from_items(source, items)
            }
            Err(error) => {
                tracing::warn!(
                    strategy = %source,
                    provider = llm.name(),
                    error = %error,
                    "discovery branch failed"
                );
                BranchOutcome::Failed { source, error }
            }
        }
    }
}

async fn with_budget<T, F>(budget: Duration, fut: F) -> Result<T, BranchError>
where
    F: Future<Output = Result<T, BranchError>>,
{
    tokio::time::timeout(budget, fut)
        .await
        .unwrap_or(Err(BranchError::TimedOut(budget)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeLlm, FakeSearch};
    use crate::llm_json::ParseError;
    use reviewscope_providers::ProviderError;
    use serde_json::json;

    const PRODUCTS: &str = r#"```json
{"products": [{"name": "Clip A", "viewCount": "1,200", "videoUrl": "https://v/a"}, {"name": "Clip B"}]}
```"#;

    fn orchestrator(
        search: FakeSearch,
        primary: FakeLlm,
        secondary: FakeLlm,
    ) -> DiscoveryOrchestrator {
        DiscoveryOrchestrator::new(
            Arc::new(search),
            Arc::new(primary),
            Arc::new(secondary),
            50,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn concatenates_branches_in_strategy_order() {
        let search = FakeSearch::titles(&["Yt 1", "Yt 2"]);
        let primary = FakeLlm::replying("gemini", PRODUCTS);
        let secondary = FakeLlm::replying("openai", r#"{"products": [{"title": "Tok 1"}]}"#);
        let discovery = orchestrator(search, primary, secondary)
            .discover("Product X", InputType::Youtube, Some(Locale::Vi))
            .await
            .unwrap();

        let sources: Vec<DiscoverySource> =
            discovery.candidates().iter().map(|(source, _)| *source).collect();
        assert_eq!(
            sources,
            vec![
                DiscoverySource::YoutubeSearch,
                DiscoverySource::YoutubeSearch,
                DiscoverySource::PrimaryLlm,
                DiscoverySource::PrimaryLlm,
                DiscoverySource::SecondaryLlm,
            ]
        );
        assert_eq!(discovery.candidates()[2].1.name, json!("Clip A"));
    }

    #[tokio::test]
    async fn search_receives_product_name_and_cap() {
        let search = FakeSearch::titles(&[]);
        let calls = search.calls();
        orchestrator(search, FakeLlm::replying("gemini", "{}"), FakeLlm::replying("openai", "{}"))
            .discover("Product X Review", InputType::Text, None)
            .await
            .unwrap();
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[("Product X Review".to_string(), 50)]
        );
    }

    #[tokio::test]
    async fn tiktok_input_skips_primary_model() {
        let primary = FakeLlm::replying("gemini", PRODUCTS);
        let primary_prompts = primary.prompts();
        let secondary = FakeLlm::replying("openai", PRODUCTS);
        let secondary_prompts = secondary.prompts();

        let discovery = orchestrator(FakeSearch::titles(&["Yt"]), primary, secondary)
            .discover("Product X", InputType::Tiktok, Some(Locale::En))
            .await
            .unwrap();

        assert!(matches!(
            discovery.branches[1],
            BranchOutcome::Empty {
                source: DiscoverySource::PrimaryLlm
            }
        ));
        assert!(primary_prompts.lock().unwrap().is_empty());
        let sent = secondary_prompts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("video tiktok review Product X"));
        assert!(sent[0].contains("'English'"));
    }

    #[tokio::test]
    async fn primary_targets_youtube_and_secondary_targets_tiktok() {
        let primary = FakeLlm::replying("gemini", "{}");
        let primary_prompts = primary.prompts();
        let secondary = FakeLlm::replying("openai", "{}");
        let secondary_prompts = secondary.prompts();

        orchestrator(FakeSearch::titles(&[]), primary, secondary)
            .discover("Product X", InputType::Website, None)
            .await
            .unwrap();

        assert!(primary_prompts.lock().unwrap()[0].contains("video youtube review"));
        assert!(secondary_prompts.lock().unwrap()[0].contains("video tiktok review"));
    }

    #[tokio::test]
    async fn model_failures_are_isolated() {
        let primary = FakeLlm::failing("gemini");
        let secondary = FakeLlm::replying("openai", "I cannot browse the internet.");

        let discovery = orchestrator(FakeSearch::titles(&["Yt"]), primary, secondary)
            .discover("Product X", InputType::Text, None)
            .await
            .unwrap();

        assert_eq!(discovery.candidates().len(), 1);
        assert!(matches!(
            discovery.branches[1],
            BranchOutcome::Failed {
                error: BranchError::Provider(ProviderError::Timeout { .. }),
                ..
            }
        ));
        assert!(matches!(
            discovery.branches[2],
            BranchOutcome::Failed {
                error: BranchError::Parse(ParseError::NoJson { .. }),
                ..
            }
        ));

        let summaries = discovery.summaries();
        assert_eq!(summaries[0].status, BranchStatus::Found);
        assert_eq!(summaries[1].status, BranchStatus::Failed);
        assert!(summaries[1].error.is_some());
    }

    #[tokio::test]
    async fn search_failure_is_fatal() {
        let err = orchestrator(
            FakeSearch::failing(),
            FakeLlm::replying("gemini", PRODUCTS),
            FakeLlm::replying("openai", PRODUCTS),
        )
        .discover("Product X", InputType::Youtube, None)
        .await
        .unwrap_err();
        assert!(matches!(err, BranchError::Provider(_)));
    }

    #[tokio::test]
    async fn slow_branch_times_out_without_blocking_siblings() {
        let discovery = DiscoveryOrchestrator::new(
            Arc::new(FakeSearch::titles(&["Yt"])),
            Arc::new(FakeLlm::replying("gemini", PRODUCTS).with_delay(Duration::from_secs(5))),
            Arc::new(FakeLlm::replying("openai", PRODUCTS)),
            50,
            Duration::from_millis(50),
        )
        .discover("Product X", InputType::Youtube, None)
        .await
        .unwrap();

        assert!(matches!(
            discovery.branches[1],
            BranchOutcome::Failed {
                error: BranchError::TimedOut(_),
                ..
            }
        ));
        assert_eq!(discovery.summaries()[2].count, 2);
    }
}
