//! modeldesk-core: everything the console screens rely on, minus the screens.
//!
//! The crate is platform-neutral: it builds requests and decodes responses but
//! never performs I/O itself. The browser console plugs in a `gloo-net`
//! transport, the CLI a `reqwest` one.

pub mod api;
pub mod config;
pub mod error;
pub mod model_form;
pub mod models;
pub mod poller;
pub mod route;
pub mod run_form;
pub mod session;
pub mod sort;
pub mod view;

pub use api::{ApiClient, ApiRequest, Body, Method, MultipartForm, RawResponse, Transport};
pub use config::{ApiConfig, CreatePathShape};
pub use error::{ModeldeskError, Result};
pub use model_form::{
    FeatureDraft, FileGate, ModelForm, SelectedFile, MODEL_FILE_EXTENSIONS, RUN_FILE_EXTENSIONS,
};
pub use models::{
    format_duration, format_timestamp,
    Dependency, Engine, Feature, FeatureType, FeatureValue, InputFeature, Language, Model,
    ModelRun, ModelType, ResourceLimits, RunState, Serialization, StatusGlyph,
};
pub use poller::{Poller, Scheduler, Subscription};
pub use route::{guard, Route};
pub use run_form::{
    coerce_input, ControlKind, FeatureControl, InputPanel, LauncherState, RunLauncher,
    RunSubmission,
};
pub use session::{MemoryTokenStore, Session, TokenStore};
pub use sort::{sort_rows, ModelSortKey, RunSortKey, SortConfig, SortDirection, Sortable};
pub use view::{InputTable, RunDetail, RunOutcome, RunRow, NO_INPUT_FEATURES};
