//! The "run model" form as an explicit state machine.
//!
//! Opening the form resets it to `Idle`; the model list arrives
//! (`ModelsLoaded`); picking a model clears previous inputs
//! (`ModelSelected`) until its schema arrives (`InputReady`), after which a
//! [`RunSubmission`] can be built.

use std::collections::HashMap;

use serde_json::json;
use tracing::debug;

use crate::api::{Body, MultipartForm};
use crate::error::{ModeldeskError, Result};
use crate::model_form::{FileGate, SelectedFile, RUN_FILE_EXTENSIONS};
use crate::models::{Feature, FeatureType, FeatureValue, InputFeature, Model, ModelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    Idle,
    ModelsLoaded,
    ModelSelected,
    InputReady,
}

/// How a feature is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Integer,
    /// Numeric input with a 0.01 step.
    Decimal,
    Checkbox,
    Text,
}

impl From<FeatureType> for ControlKind {
    fn from(kind: FeatureType) -> Self {
        match kind {
            FeatureType::Int => ControlKind::Integer,
            FeatureType::Float => ControlKind::Decimal,
            FeatureType::Boolean => ControlKind::Checkbox,
            FeatureType::String => ControlKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureControl {
    pub name: String,
    pub kind: ControlKind,
    pub value: String,
}

/// What the form shows below the model picker.
#[derive(Debug, Clone, PartialEq)]
pub enum InputPanel {
    /// No schema yet.
    Empty,
    Features(Vec<FeatureControl>),
    FileUpload,
}

/// Schema of the selected model.
#[derive(Debug, Clone, PartialEq)]
struct RunSchema {
    model_type: ModelType,
    features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunLauncher {
    models: Vec<Model>,
    models_loaded: bool,
    selected: Option<String>,
    schema: Option<RunSchema>,
    inputs: HashMap<String, String>,
    file: FileGate,
    preselect: Option<String>,
}

impl Default for RunLauncher {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            models_loaded: false,
            selected: None,
            schema: None,
            inputs: HashMap::new(),
            file: FileGate::new(RUN_FILE_EXTENSIONS),
            preselect: None,
        }
    }
}

impl RunLauncher {
    /// A launcher that selects `model_id` as soon as the model list contains it.
    pub fn with_preselect(model_id: Option<String>) -> Self {
        Self {
            preselect: model_id.filter(|id| !id.is_empty()),
            ..Self::default()
        }
    }

    pub fn state(&self) -> LauncherState {
        match (&self.selected, &self.schema) {
            (Some(_), Some(_)) => LauncherState::InputReady,
            (Some(_), None) => LauncherState::ModelSelected,
            (None, _) if self.models_loaded => LauncherState::ModelsLoaded,
            (None, _) => LauncherState::Idle,
        }
    }

    /// Start over; the pre-selection survives.
    pub fn open(&mut self) {
        let preselect = self.preselect.take();
        *self = Self {
            preselect,
            ..Self::default()
        };
    }

    /// Store the model list. Returns the id to select when the pre-selected
    /// model is present.
    pub fn models_loaded(&mut self, models: Vec<Model>) -> Option<String> {
        self.models = models;
        self.models_loaded = true;
        let preselect = self
            .preselect
            .as_ref()
            .filter(|id| self.models.iter().any(|m| &m.id == *id))
            .cloned();
        if let Some(id) = &preselect {
            self.select_model(id);
        }
        preselect
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Pick a model. Entered values, the file and its error are discarded.
    pub fn select_model(&mut self, id: &str) {
        self.inputs.clear();
        self.file.reset();
        self.schema = None;
        self.selected = Some(id.to_string()).filter(|id| !id.is_empty());
        debug!(model_id = id, "run launcher model selected");
    }

    /// Accept a schema response. Responses for a model that is no longer
    /// selected are dropped; returns whether it was applied.
    pub fn schema_loaded(&mut self, model: &Model) -> bool {
        if self.selected.as_deref() != Some(model.id.as_str()) {
            debug!(model_id = %model.id, "stale schema ignored");
            return false;
        }
        self.schema = Some(RunSchema {
            model_type: model.model_type,
            features: model.features.clone(),
        });
        true
    }

    pub fn model_type(&self) -> Option<ModelType> {
        self.schema.as_ref().map(|s| s.model_type)
    }

    pub fn panel(&self) -> InputPanel {
        let Some(schema) = &self.schema else {
            return InputPanel::Empty;
        };
        match schema.model_type {
            ModelType::Predictive => InputPanel::Features(
                schema
                    .features
                    .iter()
                    .map(|f| FeatureControl {
                        name: f.name.clone(),
                        kind: f.kind.into(),
                        value: self.inputs.get(&f.name).cloned().unwrap_or_default(),
                    })
                    .collect(),
            ),
            ModelType::Optimization => InputPanel::FileUpload,
        }
    }

    pub fn set_input(&mut self, name: &str, raw: impl Into<String>) {
        self.inputs.insert(name.to_string(), raw.into());
    }

    pub fn set_flag(&mut self, name: &str, checked: bool) {
        self.set_input(name, checked.to_string());
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }

    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        self.file.select(file)
    }

    pub fn file(&self) -> &FileGate {
        &self.file
    }

    /// Build the request for the current inputs. A missing archive also
    /// sets the file error shown under the upload control.
    pub fn submission(&mut self) -> Result<RunSubmission> {
        let model_id = self
            .selected
            .clone()
            .ok_or_else(|| ModeldeskError::InvalidInput("Please select a model.".into()))?;
        let schema = self.schema.as_ref().ok_or_else(|| {
            ModeldeskError::InvalidInput("The model's inputs are still loading.".into())
        })?;

        match schema.model_type {
            ModelType::Predictive => {
                let input_features = schema
                    .features
                    .iter()
                    .map(|f| {
                        let raw = self.inputs.get(&f.name).map(String::as_str).unwrap_or("");
                        coerce_input(f, raw).map(|value| InputFeature {
                            name: f.name.clone(),
                            value,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RunSubmission::Predictive {
                    model_id,
                    input_features,
                })
            }
            ModelType::Optimization => match self.file.selected() {
                Some(file) => Ok(RunSubmission::Optimization {
                    model_id,
                    file: file.clone(),
                }),
                None => {
                    let message = "Please upload a valid .zip file.";
                    self.file.set_error(message);
                    Err(ModeldeskError::InvalidInput(message.into()))
                }
            },
        }
    }
}

/// Convert a raw control value to the feature's type. `"0"` is a number like
/// any other, never an empty value.
pub fn coerce_input(feature: &Feature, raw: &str) -> Result<FeatureValue> {
    let trimmed = raw.trim();
    let required = || {
        ModeldeskError::InvalidInput(format!("\"{}\" requires a value.", feature.name))
    };
    let invalid = |expected: &str| {
        ModeldeskError::InvalidInput(format!(
            "\"{}\" must be {expected}, got \"{trimmed}\".",
            feature.name
        ))
    };

    match feature.kind {
        FeatureType::Int => {
            if trimmed.is_empty() {
                return Err(required());
            }
            trimmed
                .parse::<i64>()
                .map(FeatureValue::Int)
                .map_err(|_| invalid("a whole number"))
        }
        FeatureType::Float => {
            if trimmed.is_empty() {
                return Err(required());
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FeatureValue::Float)
                .ok_or_else(|| invalid("a number"))
        }
        FeatureType::Boolean => match trimmed {
            "" | "false" | "off" | "0" => Ok(FeatureValue::Bool(false)),
            "true" | "on" | "1" => Ok(FeatureValue::Bool(true)),
            _ => Err(invalid("true or false")),
        },
        FeatureType::String => Ok(FeatureValue::Text(raw.to_string())),
    }
}

/// A ready-to-send run request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunSubmission {
    Predictive {
        model_id: String,
        input_features: Vec<InputFeature>,
    },
    Optimization {
        model_id: String,
        file: SelectedFile,
    },
}

impl RunSubmission {
    pub fn model_id(&self) -> &str {
        match self {
            RunSubmission::Predictive { model_id, .. }
            | RunSubmission::Optimization { model_id, .. } => model_id,
        }
    }

    /// JSON for predictive runs, multipart for optimization runs.
    pub fn into_body(self) -> Body {
        match self {
            RunSubmission::Predictive {
                model_id,
                input_features,
            } => Body::Json(json!({
                "model_id": model_id,
                "input_features": input_features,
            })),
            RunSubmission::Optimization { model_id, file } => Body::Multipart(
                MultipartForm::new()
                    .text("model_id", model_id)
                    .file("file", file),
            ),
        }
    }
}
