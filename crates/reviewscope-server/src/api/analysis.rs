use axum::{
    extract::{Query, State},
    Extension, Json,
};
use reviewscope_core::{Analysis, AnalysisKey, LlmType, Locale};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalysisItem {
    #[serde(flatten)]
    analysis: Analysis,
    created: bool,
    discovery_started: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalysisQuery {
    pub input: Option<String>,
    pub locale: Option<String>,
    pub model: Option<String>,
}

/// Parse an optional tag parameter; blank counts as absent.
pub(super) fn parse_tag<T: std::str::FromStr>(
    req_id: &str,
    name: &str,
    raw: Option<&str>,
) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| {
            ApiError::new(
                req_id,
                "validation_error",
                format!("unsupported {name} '{value}'"),
            )
        }),
    }
}

pub(super) fn require_input(req_id: &str, raw: Option<&str>) -> Result<String, ApiError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::new(req_id, "validation_error", "input is required"))
}

/// Fetch-or-create. A newly created analysis with a product name starts
/// discovery in the background; the response does not wait for it.
pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<AnalysisItem>>, ApiError> {
    let input = require_input(&req_id.0, query.input.as_deref())?;
    let locale = parse_tag::<Locale>(&req_id.0, "locale", query.locale.as_deref())?;
    let model = parse_tag::<LlmType>(&req_id.0, "model", query.model.as_deref())?;

    let resolved = state
        .service
        .find_or_create(AnalysisKey {
            input,
            locale,
            model,
        })
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    let discovery_started = resolved.created && resolved.analysis.has_product_name();
    if discovery_started {
        state.service.spawn_discovery(resolved.analysis.clone());
    }

    Ok(Json(ApiResponse {
        data: AnalysisItem {
            analysis: resolved.analysis,
            created: resolved.created,
            discovery_started,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
