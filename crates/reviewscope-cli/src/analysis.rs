//! Analysis command handlers for the CLI.
//!
//! Output goes to stdout as pretty JSON; logs go to stderr.

use reviewscope_core::{AnalysisKey, LlmType, Locale, SortField, SortKey, VideoQuery};
use reviewscope_pipeline::{AnalysisService, DiscoveryReport};
use serde::Serialize;
use uuid::Uuid;

/// One `--sort field:dir` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SortArg {
    pub field: String,
    pub direction: String,
}

/// Parse `field[:dir]`. The field must be a sortable engagement metric; the
/// direction defaults to ascending and anything but `desc` means ascending.
pub(crate) fn parse_sort_arg(raw: &str) -> Result<SortArg, String> {
    let (field, direction) = raw.split_once(':').unwrap_or((raw, "asc"));
    let field = field.trim();
    if SortField::from_param(field).is_none() {
        return Err(format!(
            "unknown sort field '{field}'; expected one of viewCount, likeCount, \
             commentCount, favoriteCount, averageInteraction"
        ));
    }
    Ok(SortArg {
        field: field.to_string(),
        direction: direction.trim().to_string(),
    })
}

pub(crate) fn sort_keys(args: &[SortArg]) -> Vec<SortKey> {
    SortKey::from_params(
        args.iter()
            .map(|arg| (arg.field.as_str(), arg.direction.as_str())),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput {
    analysis: reviewscope_core::Analysis,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery: Option<DiscoveryReport>,
}

/// Find or create the analysis for `input` and, unless skipped or the
/// analysis already existed, run discovery in the foreground.
///
/// # Errors
///
/// Returns an error if resolution, discovery, or the store fails.
pub(crate) async fn run_analyze(
    service: &AnalysisService,
    input: String,
    locale: Option<Locale>,
    model: Option<LlmType>,
    skip_discovery: bool,
) -> anyhow::Result<()> {
    let resolved = service
        .find_or_create(AnalysisKey {
            input,
            locale,
            model,
        })
        .await?;

    let discovery = if skip_discovery || !resolved.created {
        None
    } else if !resolved.analysis.has_product_name() {
        tracing::warn!(
            analysis_id = %resolved.analysis.id,
            "product name could not be cleaned; skipping discovery"
        );
        None
    } else {
        Some(service.run_discovery(&resolved.analysis).await?)
    };

    let output = AnalyzeOutput {
        analysis: resolved.analysis,
        created: resolved.created,
        discovery,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the analysis does not exist or the query fails.
pub(crate) async fn run_videos(
    service: &AnalysisService,
    input: String,
    analysis_id: Uuid,
    locale: Option<Locale>,
    sort: &[SortArg],
) -> anyhow::Result<()> {
    if service.get_analysis(analysis_id).await?.is_none() {
        anyhow::bail!("analysis {analysis_id} not found");
    }

    let videos = service
        .list_videos(&VideoQuery {
            input,
            analysis_id,
            locale,
            sort: sort_keys(sort),
        })
        .await?;

    if videos.is_empty() {
        tracing::info!(%analysis_id, "no video candidates matched");
    }
    println!("{}", serde_json::to_string_pretty(&videos)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the analysis does not exist or the delete fails.
pub(crate) async fn run_forget(service: &AnalysisService, analysis_id: Uuid) -> anyhow::Result<()> {
    match service.forget(analysis_id).await {
        Ok(()) => {
            println!("deleted analysis {analysis_id}");
            Ok(())
        }
        Err(e) if e.is_not_found() => anyhow::bail!("analysis {analysis_id} not found"),
        Err(e) => Err(e.into()),
    }
}
