//! Console routes and the sign-in gate in front of them.

/// A view the console can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SignIn,
    ModelManagement,
    /// Run list, optionally filtered to one model.
    ModelRunner { model_id: Option<String> },
}

impl Route {
    /// Where `/` and a successful sign-in land.
    pub const DEFAULT: Route = Route::ModelManagement;

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::SignIn)
    }

    pub fn path(&self) -> String {
        match self {
            Route::SignIn => "/signin".to_string(),
            Route::ModelManagement => "/model-management".to_string(),
            Route::ModelRunner { model_id: None } => "/model-runner".to_string(),
            Route::ModelRunner {
                model_id: Some(id),
            } => format!("/model-runner?model_id={id}"),
        }
    }

    /// Resolve a location. `query` is the raw query string without `?`.
    /// Unknown paths resolve to `None`.
    pub fn from_location(path: &str, query: &str) -> Option<Route> {
        match path.trim_end_matches('/') {
            "" => Some(Route::DEFAULT),
            "/signin" => Some(Route::SignIn),
            "/model-management" => Some(Route::ModelManagement),
            "/model-runner" => {
                let model_id = query
                    .split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(k, _)| *k == "model_id")
                    .map(|(_, v)| v.to_string())
                    .filter(|v| !v.is_empty());
                Some(Route::ModelRunner { model_id })
            }
            _ => None,
        }
    }
}

/// Decide which route is actually shown.
///
/// Without a session everything but sign-in goes to sign-in; with one, the
/// sign-in view forwards to the default route.
pub fn guard(requested: Route, authenticated: bool) -> Route {
    match (authenticated, requested.requires_session()) {
        (false, true) => Route::SignIn,
        (true, false) => Route::DEFAULT,
        _ => requested,
    }
}
