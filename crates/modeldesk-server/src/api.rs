//! Routes of the console host: runtime config plus the embedded console.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use modeldesk_core::ApiConfig;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(get_api_config))
}

/// Backend endpoints the console should talk to.
async fn get_api_config(State(state): State<AppState>) -> Json<ApiConfig> {
    Json(state.api.as_ref().clone())
}

const INDEX: &str = "index.html";

/// Serve an embedded console asset, falling back to `index.html` so
/// client-side routes like `/model-runner?model_id=..` load the app.
pub async fn serve_frontend(uri: Uri) -> Response {
    let requested = uri.path().trim_start_matches('/');
    let found = Assets::get(requested)
        .map(|asset| (requested, asset))
        .or_else(|| Assets::get(INDEX).map(|asset| (INDEX, asset)));
    let Some((path, asset)) = found else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(asset.data.into_owned()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[derive(rust_embed::Embed)]
#[folder = "../../frontend/dist"]
#[include = "*.html"]
#[include = "*.js"]
#[include = "*.css"]
#[include = "*.wasm"]
struct Assets;
