use std::sync::Arc;

use reviewscope_core::{classify, Analysis, AnalysisKey, NewAnalysis, VideoCandidate, VideoQuery};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::discovery::{BranchSummary, DiscoveryOrchestrator};
use crate::error::PipelineError;
use crate::normalize::CandidateContext;
use crate::persist::persist;
use crate::ports::AnalysisStore;
use crate::resolver::ProductNameResolver;

/// An analysis plus whether this call created it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub analysis: Analysis,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub analysis_id: Uuid,
    pub product_name: String,
    pub written: u64,
    pub branches: Vec<BranchSummary>,
}

/// Entry point shared by the HTTP server and the CLI.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn AnalysisStore>,
    resolver: Arc<ProductNameResolver>,
    discovery: Arc<DiscoveryOrchestrator>,
}

impl AnalysisService {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        resolver: ProductNameResolver,
        discovery: DiscoveryOrchestrator,
    ) -> Self {
        Self {
            store,
            resolver: Arc::new(resolver),
            discovery: Arc::new(discovery),
        }
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the store is unreachable.
    pub async fn health_check(&self) -> Result<(), PipelineError> {
        Ok(self.store.health_check().await?)
    }

    /// Return the analysis for `key`, resolving and storing it first if
    /// none exists. An existing analysis is returned untouched.
    ///
    /// A degraded name-cleaning result still creates the analysis, with an
    /// empty product name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Resolution`] if no product name could be
    /// derived (nothing is stored), or [`PipelineError::Store`].
    pub async fn find_or_create(&self, key: AnalysisKey) -> Result<Resolved, PipelineError> {
        if let Some(analysis) = self.store.find_analysis(&key).await? {
            tracing::debug!(analysis_id = %analysis.id, "analysis already resolved");
            return Ok(Resolved {
                analysis,
                created: false,
            });
        }

        let input_type = classify(&key.input);
        let resolved = self.resolver.resolve(&key.input, input_type).await?;

        let analysis = self
            .store
            .upsert_analysis(&NewAnalysis {
                input: key.input,
                input_type,
                product_name: resolved.cleaned.as_product_name().to_string(),
                locale: key.locale,
                model: key.model,
            })
            .await?;

        if analysis.has_product_name() {
            tracing::info!(
                analysis_id = %analysis.id,
                input_type = %input_type,
                product_name = %analysis.product_name,
                "analysis created"
            );
        } else {
            tracing::warn!(
                analysis_id = %analysis.id,
                input_type = %input_type,
                raw_name = %resolved.raw,
                "analysis created without a product name; discovery will be skipped"
            );
        }

        Ok(Resolved {
            analysis,
            created: true,
        })
    }

    /// Discover candidates for `analysis` and append them to the store.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::EmptyProductName`] if the analysis has no name.
    /// - [`PipelineError::Search`] if `YouTube` search fails.
    /// - [`PipelineError::Store`] if the insert fails.
    pub async fn run_discovery(
        &self,
        analysis: &Analysis,
    ) -> Result<DiscoveryReport, PipelineError> {
        if !analysis.has_product_name() {
            return Err(PipelineError::EmptyProductName {
                analysis_id: analysis.id,
            });
        }

        let discovery = self
            .discovery
            .discover(&analysis.product_name, analysis.input_type, analysis.locale)
            .await
            .map_err(PipelineError::Search)?;

        let ctx = CandidateContext {
            analysis_id: analysis.id,
            raw_input: analysis.input.clone(),
            product_name: analysis.product_name.clone(),
            input_search_type: analysis.input_type,
            locale: analysis.locale,
            model: analysis.model,
        };
        let written = persist(self.store.as_ref(), &ctx, &discovery.candidates()).await?;

        Ok(DiscoveryReport {
            analysis_id: analysis.id,
            product_name: analysis.product_name.clone(),
            written,
            branches: discovery.summaries(),
        })
    }

    /// Run [`Self::run_discovery`] on a background task. Failures are logged.
    pub fn spawn_discovery(&self, analysis: Analysis) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            match service.run_discovery(&analysis).await {
                Ok(report) => tracing::info!(
                    analysis_id = %report.analysis_id,
                    count = report.written,
                    "background discovery complete"
                ),
                Err(e) => tracing::error!(
                    analysis_id = %analysis.id,
                    error = %e,
                    "background discovery failed"
                ),
            }
        })
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] on lookup failure.
    pub async fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>, PipelineError> {
        Ok(self.store.get_analysis(id).await?)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] on query failure.
    pub async fn list_videos(
        &self,
        query: &VideoQuery,
    ) -> Result<Vec<VideoCandidate>, PipelineError> {
        Ok(self.store.list_candidates(query).await?)
    }

    /// Delete an analysis and its candidates.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] wrapping `DbError::NotFound` when no
    /// such analysis exists.
    pub async fn forget(&self, id: Uuid) -> Result<(), PipelineError> {
        self.store.delete_analysis(id).await?;
        tracing::info!(analysis_id = %id, "analysis deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
