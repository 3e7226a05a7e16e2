//! Browser plumbing for the core client: HTTP over `gloo-net`, the token in
//! `localStorage`, and timers from `gloo-timers`.

use std::rc::Rc;
use std::time::Duration;

use gloo_net::http::{Request, RequestBuilder};
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use modeldesk_core::api::PartContent;
use modeldesk_core::session::TOKEN_KEY;
use modeldesk_core::{
    ApiClient, ApiConfig, ApiRequest, Body, Method, ModeldeskError, MultipartForm, RawResponse,
    Result, Scheduler, Session, Subscription, TokenStore, Transport,
};
use wasm_bindgen::JsValue;

pub type Api = ApiClient<GlooTransport>;

fn js_error(err: JsValue) -> ModeldeskError {
    ModeldeskError::Transport(format!("{err:?}"))
}

fn net_error(err: gloo_net::Error) -> ModeldeskError {
    ModeldeskError::Transport(err.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

fn form_data(form: MultipartForm) -> Result<web_sys::FormData> {
    let data = web_sys::FormData::new().map_err(js_error)?;
    for part in form.parts {
        let appended = match part.content {
            PartContent::Text(value) => data.append_with_str(&part.name, &value),
            PartContent::File(file) => {
                let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
                let blob = web_sys::Blob::new_with_u8_array_sequence(&js_sys::Array::of1(&bytes))
                    .map_err(js_error)?;
                data.append_with_blob_and_filename(&part.name, &blob, &file.name)
            }
        };
        appended.map_err(js_error)?;
    }
    Ok(data)
}

impl Transport for GlooTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let mut builder: RequestBuilder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        if let Some(value) = &request.authorization {
            builder = builder.header("Authorization", value);
        }

        let response = match request.body {
            Body::Empty => builder.send().await,
            Body::Json(value) => builder.json(&value).map_err(net_error)?.send().await,
            Body::Multipart(form) => builder.body(form_data(form)?).map_err(net_error)?.send().await,
        }
        .map_err(net_error)?;

        let status = response.status();
        let body = response.text().await.map_err(net_error)?;
        Ok(RawResponse { status, body })
    }
}

/// The session token under `localStorage["token"]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageTokenStore;

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

impl TokenStore for LocalStorageTokenStore {
    fn load(&self) -> Option<String> {
        storage()?.get_item(TOKEN_KEY).ok().flatten()
    }

    fn save(&self, token: &str) -> Result<()> {
        storage()
            .ok_or_else(|| ModeldeskError::Other("localStorage unavailable".into()))?
            .set_item(TOKEN_KEY, token)
            .map_err(|e| ModeldeskError::Other(format!("{e:?}")))
    }

    fn clear(&self) -> Result<()> {
        if let Some(storage) = storage() {
            storage
                .remove_item(TOKEN_KEY)
                .map_err(|e| ModeldeskError::Other(format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Repeating timers on the browser event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn every(&self, interval: Duration, mut tick: Box<dyn FnMut()>) -> Subscription {
        let millis = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
        let handle = Interval::new(millis, move || tick());
        Subscription::new(move || handle.cancel())
    }
}

/// Ask the host which backends to use. Falls back to the defaults when the
/// console is served without one (e.g. `trunk serve`).
pub async fn load_config() -> ApiConfig {
    let fetched = async {
        let response = Request::get("/api/config").send().await.ok()?;
        if !response.ok() {
            return None;
        }
        response.json::<ApiConfig>().await.ok()
    };
    match fetched.await {
        Some(config) => config,
        None => {
            log::warn!("no /api/config from host, using default endpoints");
            ApiConfig::default()
        }
    }
}

/// Shared handles every page reaches through context.
#[derive(Clone, Copy)]
pub struct Console {
    pub api: StoredValue<Rc<Api>, LocalStorage>,
    pub authenticated: RwSignal<bool>,
}

impl Console {
    pub fn new(config: ApiConfig) -> Self {
        let session = Session::new(LocalStorageTokenStore);
        let authenticated = RwSignal::new(session.is_authenticated());
        let api = Rc::new(ApiClient::new(config, session, GlooTransport));
        Self {
            api: StoredValue::new_local(api),
            authenticated,
        }
    }

    pub fn client(&self) -> Rc<Api> {
        self.api.get_value()
    }

    pub fn config(&self) -> ApiConfig {
        self.api.with_value(|api| api.config().clone())
    }

    /// Drop the session, e.g. on logout.
    pub fn sign_out(&self) {
        if let Err(e) = self.client().sign_out() {
            log::warn!("clearing the stored token failed: {e}");
        }
        self.authenticated.set(false);
    }
}

pub fn use_console() -> Console {
    expect_context::<Console>()
}

/// Read the first file of a file input into memory.
pub async fn read_selected_file(
    input: &web_sys::HtmlInputElement,
) -> Option<modeldesk_core::SelectedFile> {
    let file = input.files()?.get(0)?;
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .ok()?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Some(modeldesk_core::SelectedFile::new(file.name(), bytes))
}
