use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use modeldesk_core::ApiConfig;
use modeldesk_server::build_router;
use modeldesk_server::state::AppState;

async fn get(uri: &str, api: ApiConfig) -> (StatusCode, Option<String>, Vec<u8>) {
    let app = build_router(AppState::new(api));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn serves_api_config() {
    let api = ApiConfig {
        model_management_url: "http://models.internal:9000".into(),
        ..ApiConfig::default()
    };
    let (status, content_type, body) = get("/api/config", api).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let served: ApiConfig = serde_json::from_slice(&body).unwrap();
    assert_eq!(served.models_url(), "http://models.internal:9000/models");
    assert_eq!(served.runs_poll_interval_ms, 3000);
}

#[tokio::test]
async fn client_routes_fall_back_to_index() {
    let (status, content_type, _) =
        get("/model-runner?model_id=abc", ApiConfig::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
}
