use reviewscope_core::{DiscoverySource, NewVideoCandidate};

use crate::error::PipelineError;
use crate::normalize::{normalize_candidate, CandidateContext, RawCandidate};
use crate::ports::AnalysisStore;

/// Normalize `candidates` and bulk-insert them under `ctx.analysis_id`.
///
/// Append-only: running this twice for one analysis stores every row twice.
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyProductName`] if `ctx` carries no product
/// name, or [`PipelineError::Store`] if the insert fails.
pub async fn persist(
    store: &dyn AnalysisStore,
    ctx: &CandidateContext,
    candidates: &[(DiscoverySource, &RawCandidate)],
) -> Result<u64, PipelineError> {
    if ctx.product_name.trim().is_empty() {
        return Err(PipelineError::EmptyProductName {
            analysis_id: ctx.analysis_id,
        });
    }

    let rows: Vec<NewVideoCandidate> = candidates
        .iter()
        .map(|(source, raw)| normalize_candidate(ctx, *source, raw))
        .collect();

    let written = store.insert_candidates(&rows).await?;
    tracing::info!(
        analysis_id = %ctx.analysis_id,
        count = written,
        "video candidates persisted"
    );
    Ok(written)
}
