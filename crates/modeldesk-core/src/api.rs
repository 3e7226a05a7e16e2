//! Request building and response decoding for the backend services.
//!
//! `ApiClient` knows every endpoint the console calls but delegates the
//! actual exchange to a [`Transport`], so the same client runs over
//! `gloo-net` in the browser and `reqwest` on the command line.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ModeldeskError, Result};
use crate::model_form::{ModelForm, SelectedFile};
use crate::models::{Model, ModelRun, ModelType};
use crate::run_form::RunSubmission;
use crate::session::Session;
use crate::view::RunDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    Text(String),
    File(SelectedFile),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub content: PartContent,
}

/// Ordered multipart fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<Part>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &str, file: SelectedFile) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            content: PartContent::File(file),
        });
        self
    }

    /// First text field named `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match &p.content {
            PartContent::Text(v) if p.name == name => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// A fully described HTTP exchange, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    /// Complete `Authorization` header value.
    pub authorization: Option<String>,
    pub body: Body,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            authorization: None,
            body: Body::Empty,
        }
    }

    pub fn post(url: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    fn authorized(mut self, session: &Session) -> Result<Self> {
        self.authorization = Some(session.authorization().ok_or(ModeldeskError::NotSignedIn)?);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn decode<T: DeserializeOwned>(self) -> Result<T> {
        if !self.is_success() {
            return Err(ModeldeskError::from_response(self.status, &self.body));
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Performs one HTTP exchange. Implementations map connection failures to
/// `ModeldeskError::Transport` and return every HTTP status as a response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

#[derive(Deserialize)]
struct SignInReply {
    message: String,
}

/// Typed access to the access-control, model-management and model-runner
/// services.
pub struct ApiClient<T> {
    config: ApiConfig,
    session: Session,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ApiConfig, session: Session, transport: T) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn exchange(&self, request: ApiRequest) -> Result<RawResponse> {
        let method = request.method;
        let url = request.url.clone();
        debug!(?method, %url, "request");
        let response = self.transport.send(request).await;
        match &response {
            Ok(r) if !r.is_success() => warn!(?method, %url, status = r.status, "request rejected"),
            Err(e) => warn!(?method, %url, error = %e, "request failed"),
            Ok(_) => {}
        }
        response
    }

    /// Exchange credentials for a token and start the session. Every
    /// failure collapses into `SignInFailed`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let request = ApiRequest::post(
            self.config.signin_url(),
            Body::Json(json!({ "email": email, "password": password })),
        );
        let response = self
            .exchange(request)
            .await
            .map_err(|_| ModeldeskError::SignInFailed)?;
        if response.status != 200 {
            return Err(ModeldeskError::SignInFailed);
        }
        let reply: SignInReply =
            serde_json::from_str(&response.body).map_err(|_| ModeldeskError::SignInFailed)?;
        self.session.establish(reply.message)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.session.end()
    }

    pub async fn list_models(&self) -> Result<Vec<Model>> {
        let request = ApiRequest::get(self.config.models_url()).authorized(&self.session)?;
        self.exchange(request).await?.decode()
    }

    pub async fn get_model(&self, id: &str) -> Result<Model> {
        let request = ApiRequest::get(self.config.model_url(id)).authorized(&self.session)?;
        self.exchange(request).await?.decode()
    }

    /// Validate the form and register the model it describes.
    pub async fn create_model(&self, form: &ModelForm) -> Result<Model> {
        let request = self.create_model_request(form)?;
        self.exchange(request).await?.decode()
    }

    pub fn create_model_request(&self, form: &ModelForm) -> Result<ApiRequest> {
        let body = form.to_multipart()?;
        let url = self
            .config
            .model_create_url(form.model_type, form.engine, form.language);
        ApiRequest::post(url, Body::Multipart(body)).authorized(&self.session)
    }

    /// Runs of every model, or of one when `model_id` is given.
    pub async fn list_runs(&self, model_id: Option<&str>) -> Result<Vec<ModelRun>> {
        let mut request = ApiRequest::get(self.config.model_runs_url());
        if let Some(id) = model_id.filter(|id| !id.is_empty()) {
            request = request.query("model_id", id);
        }
        let request = request.authorized(&self.session)?;
        self.exchange(request).await?.decode()
    }

    pub async fn get_run(&self, id: &str) -> Result<ModelRun> {
        let request = ApiRequest::get(self.config.model_run_url(id)).authorized(&self.session)?;
        self.exchange(request).await?.decode()
    }

    /// The run plus the type of the model it belongs to.
    pub async fn run_detail(&self, id: &str) -> Result<RunDetail> {
        let run = self.get_run(id).await?;
        let model_type: ModelType = self.get_model(&run.model_id).await?.model_type;
        Ok(RunDetail::new(run, model_type))
    }

    pub async fn submit_run(&self, submission: RunSubmission) -> Result<ModelRun> {
        let request = self.submit_run_request(submission)?;
        self.exchange(request).await?.decode()
    }

    pub fn submit_run_request(&self, submission: RunSubmission) -> Result<ApiRequest> {
        let url = self.config.run_submit_url(submission.model_id());
        let body = submission.into_body();
        ApiRequest::post(url, body).authorized(&self.session)
    }
}
