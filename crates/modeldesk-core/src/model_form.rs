//! State of the "add model" form and the upload gate it shares with the run
//! launcher.

use std::collections::HashSet;
use std::fmt;

use serde_json::json;

use crate::api::MultipartForm;
use crate::error::{ModeldeskError, Result};
use crate::models::{Dependency, Engine, FeatureType, Language, ModelType, Serialization};

/// Artifacts accepted when registering a model.
pub const MODEL_FILE_EXTENSIONS: &[&str] = &[".pkl", ".sav", ".rds", ".zip"];

/// Archives accepted for optimization runs.
pub const RUN_FILE_EXTENSIONS: &[&str] = &[".zip"];

/// A file picked by the user, read into memory.
#[derive(Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Text after the last dot, with the dot. A name without a dot is its own
    /// extension, so `"model"` yields `".model"`.
    pub fn extension(&self) -> String {
        let ext = self.name.rsplit('.').next().unwrap_or_default();
        format!(".{ext}")
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Advisory extension check in front of a file input. The backend remains the
/// authority on what it accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGate {
    allowed: &'static [&'static str],
    selected: Option<SelectedFile>,
    error: Option<String>,
}

impl FileGate {
    pub fn new(allowed: &'static [&'static str]) -> Self {
        Self {
            allowed,
            selected: None,
            error: None,
        }
    }

    pub fn allowed(&self) -> &'static [&'static str] {
        self.allowed
    }

    /// Comma-separated list for the input's `accept` attribute.
    pub fn accept(&self) -> String {
        self.allowed.join(",")
    }

    /// Record `file` if its extension is allowed; otherwise drop any previous
    /// selection and set the error. Returns whether the file was kept.
    pub fn select(&mut self, file: SelectedFile) -> bool {
        let ext = file.extension().to_ascii_lowercase();
        if self.allowed.contains(&ext.as_str()) {
            self.selected = Some(file);
            self.error = None;
            true
        } else {
            self.selected = None;
            self.error = Some(self.rejection_message());
            false
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        self.selected = None;
        self.error = None;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// "Only .zip files are allowed." / "Only .pkl, .sav, .rds, and .zip files are allowed."
    fn rejection_message(&self) -> String {
        let list = match self.allowed {
            [] => String::new(),
            [one] => one.to_string(),
            [a, b] => format!("{a} and {b}"),
            [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        };
        format!("Only {list} files are allowed.")
    }
}

/// One editable feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDraft {
    pub name: String,
    pub kind: FeatureType,
}

impl Default for FeatureDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: FeatureType::Int,
        }
    }
}

/// The add-model form.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForm {
    pub name: String,
    pub model_type: ModelType,
    pub engine: Engine,
    pub language: Language,
    pub docker_tag: String,
    pub serialization: Serialization,
    pub features: Vec<FeatureDraft>,
    pub dependencies: Vec<Dependency>,
    pub mem_limit: String,
    pub cpu_percentage: String,
    pub file: FileGate,
}

impl Default for ModelForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            model_type: ModelType::Predictive,
            engine: Engine::Docker,
            language: Language::Python3,
            docker_tag: Language::Python3.default_docker_tag().to_string(),
            serialization: Serialization::Joblib,
            features: vec![FeatureDraft::default()],
            dependencies: vec![Dependency::default()],
            mem_limit: "256M".to_string(),
            cpu_percentage: "50".to_string(),
            file: FileGate::new(MODEL_FILE_EXTENSIONS),
        }
    }
}

impl ModelForm {
    pub fn set_type(&mut self, model_type: ModelType) {
        self.model_type = model_type;
        if !self.language.supports(model_type) {
            self.set_language(Language::Python3);
        }
    }

    /// Changing language also swaps in that runtime's default image tag.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.docker_tag = language.default_docker_tag().to_string();
    }

    /// Languages offered for the current model type.
    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|l| l.supports(self.model_type))
            .collect()
    }

    pub fn uses_docker(&self) -> bool {
        self.engine == Engine::Docker
    }

    pub fn shows_features(&self) -> bool {
        self.model_type == ModelType::Predictive
    }

    pub fn shows_serialization(&self) -> bool {
        self.shows_features() && self.uses_docker() && self.language == Language::Python3
    }

    pub fn add_feature(&mut self) {
        self.features.push(FeatureDraft::default());
    }

    pub fn remove_feature(&mut self, index: usize) {
        if index < self.features.len() {
            self.features.remove(index);
        }
    }

    pub fn add_dependency(&mut self) {
        self.dependencies.push(Dependency::default());
    }

    pub fn remove_dependency(&mut self, index: usize) {
        if index < self.dependencies.len() {
            self.dependencies.remove(index);
        }
    }

    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        self.file.select(file)
    }

    pub fn error(&self) -> Option<&str> {
        self.file.error()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ModeldeskError::InvalidInput(msg.to_string()));

        if self.name.trim().is_empty() {
            return invalid("Name is required.");
        }
        if self.file.selected().is_none() {
            return invalid("Please select a model file.");
        }
        if self.uses_docker() {
            if self.docker_tag.trim().is_empty() {
                return invalid("Docker tag is required.");
            }
            if self.mem_limit.trim().is_empty() {
                return invalid("Memory limit is required.");
            }
            match self.cpu_percentage.trim().parse::<u32>() {
                Ok(1..=100) => {}
                _ => return invalid("CPU percentage must be a whole number between 1 and 100."),
            }
        }
        if self.shows_features() {
            let mut seen = HashSet::new();
            for feature in &self.features {
                let name = feature.name.trim();
                if name.is_empty() {
                    return invalid("Every feature needs a name.");
                }
                if !seen.insert(name) {
                    return Err(ModeldeskError::InvalidInput(format!(
                        "Feature \"{name}\" is declared twice."
                    )));
                }
            }
        }
        if self
            .dependencies
            .iter()
            .any(|d| d.library.trim().is_empty() || d.version.trim().is_empty())
        {
            return invalid("Every dependency needs a library and a version.");
        }
        Ok(())
    }

    /// Validated multipart payload for the model-creation endpoint.
    pub fn to_multipart(&self) -> Result<MultipartForm> {
        self.validate()?;
        let file = self
            .file
            .selected()
            .cloned()
            .ok_or_else(|| ModeldeskError::InvalidInput("Please select a model file.".into()))?;

        let mut form = MultipartForm::new()
            .file("file", file)
            .text("name", self.name.trim())
            .text("type", self.model_type.as_str())
            .text("engine", self.engine.as_str());

        if self.uses_docker() {
            form = form
                .text("language", self.language.as_str())
                .text("docker_tag", self.docker_tag.trim())
                .text("mem_limit", self.mem_limit.trim())
                .text("cpu_percentage", self.cpu_percentage.trim());
        }

        if self.shows_features() {
            let features: Vec<_> = self
                .features
                .iter()
                .enumerate()
                .map(|(i, f)| json!({ "name": f.name.trim(), "type": f.kind.as_str(), "order": i + 1 }))
                .collect();
            form = form.text("features", serde_json::Value::Array(features).to_string());
            if self.shows_serialization() {
                form = form.text("serialization", self.serialization.as_str());
            }
        }

        form = form.text("dependencies", serde_json::to_string(&self.dependencies)?);
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ModelForm {
        let mut form = ModelForm {
            name: "churn".into(),
            ..ModelForm::default()
        };
        form.features[0].name = "age".into();
        form.add_feature();
        form.features[1] = FeatureDraft {
            name: "plan".into(),
            kind: FeatureType::String,
        };
        form.dependencies[0] = Dependency {
            library: "scikit-learn".into(),
            version: "1.3.0".into(),
        };
        form.select_file(SelectedFile::new("model.pkl", vec![1, 2, 3]));
        form
    }

    #[test]
    fn gate_rejects_then_accepts() {
        let mut gate = FileGate::new(MODEL_FILE_EXTENSIONS);
        assert!(!gate.select(SelectedFile::new("model.exe", vec![0])));
        assert!(gate.selected().is_none());
        assert_eq!(
            gate.error(),
            Some("Only .pkl, .sav, .rds, and .zip files are allowed.")
        );

        assert!(gate.select(SelectedFile::new("model.zip", vec![0])));
        assert!(gate.error().is_none());
        assert_eq!(gate.selected().map(|f| f.name.as_str()), Some("model.zip"));
    }

    #[test]
    fn rejected_file_replaces_previous_selection() {
        let mut gate = FileGate::new(RUN_FILE_EXTENSIONS);
        gate.select(SelectedFile::new("input.zip", vec![]));
        gate.select(SelectedFile::new("input.tar", vec![]));
        assert!(gate.selected().is_none());
        assert_eq!(gate.error(), Some("Only .zip files are allowed."));
    }

    #[test]
    fn extension_matching() {
        assert_eq!(SelectedFile::new("a.b.PKL", vec![]).extension(), ".PKL");
        assert_eq!(SelectedFile::new("zip", vec![]).extension(), ".zip");
        let mut gate = FileGate::new(MODEL_FILE_EXTENSIONS);
        assert!(gate.select(SelectedFile::new("a.b.PKL", vec![])));
    }

    #[test]
    fn language_switch_sets_docker_tag() {
        let mut form = ModelForm::default();
        form.set_language(Language::R);
        assert_eq!(form.docker_tag, "4.1.3");
        assert!(!form.shows_serialization());

        form.set_type(ModelType::Optimization);
        assert_eq!(form.language, Language::Python3);
        assert_eq!(form.docker_tag, "3.9");
        assert_eq!(form.languages(), vec![Language::Python3]);
    }

    #[test]
    fn validation_catches_incomplete_rows() {
        let mut form = filled();
        assert!(form.validate().is_ok());

        form.cpu_percentage = "150".into();
        assert!(form.validate().is_err());
        form.cpu_percentage = "50".into();

        form.features[1].name = "age".into();
        let err = form.validate().unwrap_err();
        assert_eq!(err.user_message(), "Feature \"age\" is declared twice.");

        form.set_type(ModelType::Optimization);
        assert!(form.validate().is_ok());

        form.dependencies.push(Dependency::default());
        assert!(form.validate().is_err());
    }

    #[test]
    fn multipart_numbers_features_from_one() {
        let form = filled().to_multipart().unwrap();
        assert!(form.has_field("file"));
        assert_eq!(form.text_value("type"), Some("predictive"));
        assert_eq!(form.text_value("language"), Some("Python3"));
        assert_eq!(form.text_value("serialization"), Some("joblib"));

        let features: serde_json::Value =
            serde_json::from_str(form.text_value("features").unwrap()).unwrap();
        assert_eq!(
            features,
            json!([
                {"name": "age", "type": "int", "order": 1},
                {"name": "plan", "type": "string", "order": 2}
            ])
        );
        let deps: serde_json::Value =
            serde_json::from_str(form.text_value("dependencies").unwrap()).unwrap();
        assert_eq!(deps, json!([{"library": "scikit-learn", "version": "1.3.0"}]));
    }

    #[test]
    fn optimization_on_test_engine_sends_minimal_fields() {
        let mut form = filled();
        form.set_type(ModelType::Optimization);
        form.engine = Engine::Test;
        let parts = form.to_multipart().unwrap();
        assert!(!parts.has_field("language"));
        assert!(!parts.has_field("features"));
        assert!(!parts.has_field("serialization"));
        assert!(parts.has_field("dependencies"));
    }
}
