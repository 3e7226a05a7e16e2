//! Shared state and configuration for the console host.

use std::sync::Arc;

use modeldesk_core::ApiConfig;

#[derive(Clone)]
pub struct AppState {
    /// Backend endpoints handed to the browser console at startup.
    pub api: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(api: ApiConfig) -> Self {
        Self { api: Arc::new(api) }
    }
}

/// Configuration for the console host.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api: ApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api: ApiConfig::default(),
        }
    }
}
