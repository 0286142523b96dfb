use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use reviewscope_core::{AnalysisKey, Locale};
use reviewscope_pipeline::fakes::{FakeLlm, FakeMetadata, FakePages, FakeSearch, MemoryStore};
use reviewscope_pipeline::{DiscoveryOrchestrator, ProductNameResolver};
use tower::ServiceExt;

use super::*;

const PASSWORD: &str = "letmein";
const PRODUCTS: &str = r#"{"products": [{"name": "Tok clip", "viewCount": "9,000"}]}"#;

fn service(gemini_reply: &str) -> (AnalysisService, MemoryStore) {
    let store = MemoryStore::default();
    let gemini = Arc::new(FakeLlm::replying("gemini", gemini_reply));
    let resolver = ProductNameResolver::new(
        Arc::new(FakeMetadata::titled("youtube", "Product X Review")),
        Arc::new(FakeMetadata::missing("tiktok")),
        Arc::new(FakePages::broken()),
        gemini.clone(),
    );
    let discovery = DiscoveryOrchestrator::new(
        Arc::new(FakeSearch::titles(&["Yt A", "Yt B"])),
        gemini,
        Arc::new(FakeLlm::replying("openai", PRODUCTS)),
        50,
        Duration::from_secs(5),
    );
    (
        AnalysisService::new(Arc::new(store.clone()), resolver, discovery),
        store,
    )
}

fn app(service: AnalysisService) -> Router {
    build_app(
        AppState { service },
        PasswordGate::new(PASSWORD),
        default_rate_limit_state(),
    )
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_is_public() {
    let (service, _) = service("{}");
    let (status, json) = get_json(&app(service), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let (service, _) = service("{}");
    let response = app(service)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn analysis_requires_password() {
    let (service, store) = service(r#"{"name": "Air Fryer X"}"#);
    let app = app(service);

    let (status, json) = get_json(&app, "/api/v1/analysis?input=air%20fryer").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let (status, _) = get_json(&app, "/api/v1/analysis?input=air%20fryer&password=nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(store.analyses().is_empty());
}

#[tokio::test]
async fn analysis_is_created_once_then_served_from_store() {
    let (service, store) = service(r#"{"name": "Air Fryer X"}"#);
    let app = app(service);
    let uri = format!("/api/v1/analysis?input=air%20fryer&locale=vi&password={PASSWORD}");

    let (status, first) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["productName"], "Air Fryer X");
    assert_eq!(first["data"]["inputType"], "text");
    assert_eq!(first["data"]["locale"], "vi");
    assert_eq!(first["data"]["created"], true);
    assert_eq!(first["data"]["discoveryStarted"], true);

    let (status, second) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["created"], false);
    assert_eq!(second["data"]["discoveryStarted"], false);
    assert_eq!(store.analyses().len(), 1);
}

#[tokio::test]
async fn degraded_name_skips_discovery() {
    let (service, store) = service("no idea");
    let (status, json) = get_json(
        &app(service),
        &format!("/api/v1/analysis?input=air%20fryer&password={PASSWORD}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["productName"], "");
    assert_eq!(json["data"]["discoveryStarted"], false);
    assert!(store.candidates().is_empty());
}

#[tokio::test]
async fn analysis_validates_parameters() {
    let (service, _) = service("{}");
    let app = app(service);

    let (status, json) = get_json(&app, &format!("/api/v1/analysis?password={PASSWORD}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, json) = get_json(
        &app,
        &format!("/api/v1/analysis?input=x&locale=fr&password={PASSWORD}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "unsupported locale 'fr'");

    let (status, _) = get_json(
        &app,
        &format!("/api/v1/analysis?input=x&model=gpt9&password={PASSWORD}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resolution_failure_is_generic_server_error() {
    let (service, store) = service("I cannot open links");
    let (status, json) = get_json(
        &app(service),
        &format!(
            "/api/v1/analysis?input=https%3A%2F%2Fshop.example.com%2Fp%2F1&password={PASSWORD}"
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "internal_error");
    assert_eq!(json["error"]["message"], "failed to resolve product");
    assert!(store.analyses().is_empty());
}

#[tokio::test]
async fn videos_lists_candidates_for_analysis() {
    let (service, _) = service(r#"{"name": "Air Fryer X"}"#);
    let analysis = service
        .find_or_create(AnalysisKey {
            input: "air fryer".to_string(),
            locale: Some(Locale::En),
            model: None,
        })
        .await
        .expect("analysis")
        .analysis;
    let report = service.run_discovery(&analysis).await.expect("discovery");
    let app = app(service);

    let (status, json) = get_json(
        &app,
        &format!(
            "/api/v1/analysis/video?input=air%20fryer&analysisId={}&locale=en&viewCount=DESC&password={PASSWORD}",
            analysis.id
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().expect("data array");
    assert_eq!(data.len() as u64, report.written);
    assert!(data.iter().all(|row| row["analysisId"] == analysis.id.to_string()));
    assert_eq!(data[0]["title"], "Tok clip");
    assert_eq!(data[0]["viewCount"], 9000);
    let views: Vec<i64> = data
        .iter()
        .map(|row| row["viewCount"].as_i64().expect("viewCount"))
        .collect();
    assert!(views.windows(2).all(|pair| pair[0] >= pair[1]));

    let (status, json) = get_json(
        &app,
        &format!(
            "/api/v1/analysis/video?input=Air%20Fryer%20X&analysisId={}&sort%5BlikeCount%5D=asc&password={PASSWORD}",
            analysis.id
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let liked = json["data"].as_array().expect("data array");
    assert_eq!(liked.len(), data.len());
    assert_eq!(liked[0]["likeCount"], 0);
    assert_eq!(liked[0]["title"], "Tok clip");

    let (status, json) = get_json(
        &app,
        &format!(
            "/api/v1/analysis/video?input=air%20fryer&analysisId={}&password={PASSWORD}",
            analysis.id
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|row| row["title"].as_str())
        .collect();
    assert_eq!(titles[..2], ["Yt A", "Yt B"]);
}

#[tokio::test]
async fn videos_rejects_bad_or_unknown_analysis() {
    let (service, _) = service("{}");
    let app = app(service);

    let (status, _) = get_json(
        &app,
        &format!("/api/v1/analysis/video?input=x&analysisId=not-a-uuid&password={PASSWORD}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(
        &app,
        &format!("/api/v1/analysis/video?input=x&password={PASSWORD}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get_json(
        &app,
        &format!(
            "/api/v1/analysis/video?input=x&analysisId={}&password={PASSWORD}",
            uuid::Uuid::new_v4()
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn rate_limit_applies_to_protected_routes() {
    let (service, _) = service(r#"{"name": "Air Fryer X"}"#);
    let app = build_app(
        AppState { service },
        PasswordGate::new(PASSWORD),
        RateLimitState::new(1, Duration::from_secs(60)),
    );
    let uri = format!("/api/v1/analysis?input=air%20fryer&password={PASSWORD}");

    let (status, _) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}
