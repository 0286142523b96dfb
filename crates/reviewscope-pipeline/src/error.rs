use std::time::Duration;

use reviewscope_core::InputType;
use reviewscope_db::DbError;
use reviewscope_providers::ProviderError;
use thiserror::Error;
use uuid::Uuid;

use crate::llm_json::ParseError;

/// Every strategy for deriving a product name failed.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("input is empty")]
    EmptyInput,

    #[error("{input_type} input resolved to an empty product name")]
    EmptyName { input_type: InputType },

    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("product trace response unusable: {0}")]
    Parse(#[from] ParseError),
}

/// Why one discovery branch produced nothing.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("branch timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("product name resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("youtube search failed: {0}")]
    Search(#[source] BranchError),

    #[error("analysis {analysis_id} has no product name; discovery refused")]
    EmptyProductName { analysis_id: Uuid },

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl PipelineError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::Store(DbError::NotFound))
    }
}
