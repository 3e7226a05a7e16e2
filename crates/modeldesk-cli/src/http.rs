//! `reqwest` implementation of the core transport.

use modeldesk::api::{Part, PartContent};
use modeldesk::{ApiRequest, Body, Method, ModeldeskError, MultipartForm, RawResponse, Result, Transport};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart;

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn transport_error(err: reqwest::Error) -> ModeldeskError {
    ModeldeskError::Transport(err.to_string())
}

fn to_form(form: MultipartForm) -> Result<multipart::Form> {
    let mut out = multipart::Form::new();
    for Part { name, content } in form.parts {
        out = match content {
            PartContent::Text(value) => out.text(name, value),
            PartContent::File(file) => {
                let mime = file_mime(&file.name);
                let part = multipart::Part::bytes(file.bytes)
                    .file_name(file.name)
                    .mime_str(mime)
                    .map_err(transport_error)?;
                out.part(name, part)
            }
        };
    }
    Ok(out)
}

fn file_mime(name: &str) -> &'static str {
    if name.to_ascii_lowercase().ends_with(".zip") {
        "application/zip"
    } else {
        "application/octet-stream"
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let ApiRequest {
            method,
            url,
            query,
            authorization,
            body,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(form) => builder.multipart(to_form(form)?),
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use modeldesk::SelectedFile;
    use serde_json::json;

    #[tokio::test]
    async fn sends_query_bearer_and_json() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/model-runs/m1")
                .query_param("trace", "1")
                .header("authorization", "Bearer tok")
                .json_body(json!({"model_id": "m1", "input_features": []}));
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!({"ok": true}));
        });

        let request = ApiRequest::post(
            server.url("/model-runs/m1"),
            Body::Json(json!({"model_id": "m1", "input_features": []})),
        )
        .query("trace", "1");
        let request = ApiRequest {
            authorization: Some("Bearer tok".into()),
            ..request
        };
        let response = ReqwestTransport::new().send(request).await.unwrap();

        mock.assert();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn sends_multipart_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/model-runs/opt")
                .body_contains("name=\"model_id\"")
                .body_contains("filename=\"input.zip\"")
                .body_contains("PK-archive");
            then.status(201).body("{}");
        });

        let form = MultipartForm::new()
            .text("model_id", "opt")
            .file("file", SelectedFile::new("input.zip", b"PK-archive".to_vec()));
        let request = ApiRequest::post(server.url("/model-runs/opt"), Body::Multipart(form));
        let response = ReqwestTransport::new().send(request).await.unwrap();

        mock.assert();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn error_statuses_are_responses() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/models");
            then.status(401).body("unauthorized");
        });

        let response = ReqwestTransport::new()
            .send(ApiRequest::get(server.url("/models")))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(response.body, "unauthorized");
    }

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        let request = ApiRequest::get("http://127.0.0.1:9/models");
        let err = ReqwestTransport::new().send(request).await.unwrap_err();
        assert!(matches!(err, ModeldeskError::Transport(_)));
    }
}
