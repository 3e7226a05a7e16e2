//! Endpoint configuration for the three backend services.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Engine, Language, ModelType};

/// How the model-management service expects creation requests to be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatePathShape {
    /// `POST {models}`
    Flat,
    /// `POST {models}/{type}/{engine}/{language}`
    #[default]
    Typed,
}

/// Where the console finds its backends and how often it polls them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Access-control service (sign-in).
    pub access_control_url: String,
    /// Model-management service.
    pub model_management_url: String,
    /// Model-runner service.
    pub model_runner_url: String,
    pub model_create_path: CreatePathShape,
    pub runs_poll_interval_ms: u64,
    pub detail_poll_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_control_url: "http://127.0.0.1:3001".to_string(),
            model_management_url: "http://127.0.0.1:3002".to_string(),
            model_runner_url: "http://127.0.0.1:3003".to_string(),
            model_create_path: CreatePathShape::Typed,
            runs_poll_interval_ms: 3000,
            detail_poll_interval_ms: 3000,
        }
    }
}

impl ApiConfig {
    /// Load from a YAML file; missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn signin_url(&self) -> String {
        format!("{}/signin", trim(&self.access_control_url))
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", trim(&self.model_management_url))
    }

    pub fn model_url(&self, id: &str) -> String {
        format!("{}/{}", self.models_url(), id)
    }

    pub fn model_create_url(
        &self,
        model_type: ModelType,
        engine: Engine,
        language: Language,
    ) -> String {
        match self.model_create_path {
            CreatePathShape::Flat => self.models_url(),
            CreatePathShape::Typed => format!(
                "{}/{}/{}/{}",
                self.models_url(),
                model_type,
                engine,
                language.path_segment()
            ),
        }
    }

    pub fn model_runs_url(&self) -> String {
        format!("{}/model-runs", trim(&self.model_runner_url))
    }

    pub fn model_run_url(&self, id: &str) -> String {
        format!("{}/{}", self.model_runs_url(), id)
    }

    /// Runs are submitted against the model they execute.
    pub fn run_submit_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.model_runs_url(), model_id)
    }
}

fn trim(base: &str) -> &str {
    base.trim_end_matches('/')
}
