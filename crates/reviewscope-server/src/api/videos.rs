use axum::{
    extract::{Query, State},
    Extension, Json,
};
use reviewscope_core::{Locale, SortKey, VideoCandidate, VideoQuery};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::analysis::{parse_tag, require_input};
use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Lists stored candidates for one analysis. Sort keys come from
/// `<field>=ASC|DESC` or `sort[<field>]=ASC|DESC` pairs, in request order.
pub(super) async fn list_videos(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Vec<VideoCandidate>>>, ApiError> {
    let input = require_input(&req_id.0, param(&params, "input"))?;
    let analysis_id = param(&params, "analysisId")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::new(req_id.0.clone(), "validation_error", "analysisId is required")
        })?
        .parse::<Uuid>()
        .map_err(|_| {
            ApiError::new(req_id.0.clone(), "validation_error", "analysisId must be a UUID")
        })?;
    let locale = parse_tag::<Locale>(&req_id.0, "locale", param(&params, "locale"))?;

    let exists = state
        .service
        .get_analysis(analysis_id)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    if exists.is_none() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("analysis {analysis_id} not found"),
        ));
    }

    let query = VideoQuery {
        input,
        analysis_id,
        locale,
        sort: SortKey::from_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
    };
    let data = state
        .service
        .list_videos(&query)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
