//! Entities exchanged with the model-management and model-runner services.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// What a model produces: predictions from typed features, or an optimization
/// result from an uploaded archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Predictive,
    Optimization,
}

impl ModelType {
    pub const ALL: [ModelType; 2] = [ModelType::Predictive, ModelType::Optimization];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Predictive => "predictive",
            ModelType::Optimization => "optimization",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Docker,
    Test,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::Docker, Engine::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Docker => "docker",
            Engine::Test => "test",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python3,
    R,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python3, Language::R];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python3 => "Python3",
            Language::R => "R",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }

    /// Segment used in typed model-creation paths: the name without digits.
    pub fn path_segment(&self) -> String {
        self.as_str().chars().filter(|c| !c.is_ascii_digit()).collect()
    }

    /// Runtime image tag preselected when the language is picked.
    pub fn default_docker_tag(&self) -> &'static str {
        match self {
            Language::Python3 => "3.9",
            Language::R => "4.1.3",
        }
    }

    /// R runtimes only serve predictive models.
    pub fn supports(&self, model_type: ModelType) -> bool {
        match self {
            Language::Python3 => true,
            Language::R => model_type == ModelType::Predictive,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Serialization {
    Joblib,
    Pickle,
}

impl Serialization {
    pub const ALL: [Serialization; 2] = [Serialization::Joblib, Serialization::Pickle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Serialization::Joblib => "joblib",
            Serialization::Pickle => "pickle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Primitive type of a feature slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Int,
    Float,
    #[serde(alias = "bool")]
    Boolean,
    String,
}

impl FeatureType {
    pub const ALL: [FeatureType; 4] = [
        FeatureType::Int,
        FeatureType::Float,
        FeatureType::Boolean,
        FeatureType::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Int => "int",
            FeatureType::Float => "float",
            FeatureType::Boolean => "boolean",
            FeatureType::String => "string",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(FeatureType::Boolean),
            _ => Self::ALL.into_iter().find(|t| t.as_str() == s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeatureType,
    /// 1-based position, assigned at submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dependency {
    pub library: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Container memory cap, e.g. "256M".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_u32"
    )]
    pub cpu_percentage: Option<u32>,
}

/// Multipart submissions store numbers as strings; accept either.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A registered model as returned by the model-management service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModelWire")]
pub struct Model {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub engine: Engine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_tag: Option<String>,
    #[serde(flatten)]
    pub limits: ResourceLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization: Option<Serialization>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Model as sent by the service, which may carry `created_at`, `createdAt`
/// or both on one record.
#[derive(Deserialize)]
struct ModelWire {
    #[serde(alias = "_id")]
    id: String,
    name: String,
    #[serde(rename = "type")]
    model_type: ModelType,
    engine: Engine,
    #[serde(default)]
    language: Option<Language>,
    #[serde(default)]
    docker_tag: Option<String>,
    #[serde(flatten)]
    limits: ResourceLimits,
    #[serde(default)]
    serialization: Option<Serialization>,
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Option<DateTime<Utc>>,
}

impl From<ModelWire> for Model {
    fn from(wire: ModelWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            model_type: wire.model_type,
            engine: wire.engine,
            language: wire.language,
            docker_tag: wire.docker_tag,
            limits: wire.limits,
            serialization: wire.serialization,
            features: wire.features,
            dependencies: wire.dependencies,
            created_at: wire.created_at.or(wire.created_at_camel),
        }
    }
}

/// A feature value sent with a predictive run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Shown as an empty cell.
    Null,
    /// Anything else the runner stored, kept as raw JSON.
    Other(serde_json::Value),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v}"),
            FeatureValue::Bool(v) => write!(f, "{v}"),
            FeatureValue::Text(v) => f.write_str(v),
            FeatureValue::Null => Ok(()),
            FeatureValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}
impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}
impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}
impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFeature {
    pub name: String,
    pub value: FeatureValue,
}

/// Run lifecycle as reported by the runner.
///
/// Only `finished` and `failed` are terminal; every other label (queued,
/// running, or anything the runner adds later) is kept verbatim as in
/// progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunState {
    Finished,
    Failed,
    InProgress(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        match self {
            RunState::Finished | RunState::Failed => true,
            RunState::InProgress(_) => false,
        }
    }

    pub fn glyph(&self) -> StatusGlyph {
        match self {
            RunState::Finished => StatusGlyph::Success,
            RunState::Failed => StatusGlyph::Failure,
            RunState::InProgress(_) => StatusGlyph::Busy,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RunState::Finished => "finished",
            RunState::Failed => "failed",
            RunState::InProgress(label) => label,
        }
    }
}

impl From<String> for RunState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "finished" => RunState::Finished,
            "failed" => RunState::Failed,
            _ => RunState::InProgress(s),
        }
    }
}

impl From<&str> for RunState {
    fn from(s: &str) -> Self {
        RunState::from(s.to_string())
    }
}

impl From<RunState> for String {
    fn from(s: RunState) -> Self {
        match s {
            RunState::InProgress(label) => label,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status indicator shown next to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGlyph {
    Success,
    Failure,
    Busy,
}

impl StatusGlyph {
    pub fn symbol(&self) -> &'static str {
        match self {
            StatusGlyph::Success => "✔",
            StatusGlyph::Failure => "✖",
            StatusGlyph::Busy => "⟳",
        }
    }
}

/// One execution of a model. Owned by the runner; the console only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelRunWire")]
pub struct ModelRun {
    #[serde(alias = "_id")]
    pub id: String,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_engine: Option<Engine>,
    pub state: RunState,
    #[serde(default)]
    pub input_features: Vec<InputFeature>,
    /// Reference to the archive uploaded for an optimization run.
    #[serde(default, alias = "file", skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_exit_code: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Run as sent by the runner. Timestamps arrive in snake_case, camelCase or
/// both; snake_case wins when both are present.
#[derive(Deserialize)]
struct ModelRunWire {
    #[serde(alias = "_id")]
    id: String,
    model_id: String,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    model_type: Option<ModelType>,
    #[serde(default)]
    model_engine: Option<Engine>,
    state: RunState,
    #[serde(default)]
    input_features: Vec<InputFeature>,
    #[serde(default, alias = "file")]
    input_file: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    logs: Option<serde_json::Value>,
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    container_exit_code: Option<i64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt")]
    updated_at_camel: Option<DateTime<Utc>>,
}

impl TryFrom<ModelRunWire> for ModelRun {
    type Error = String;

    fn try_from(wire: ModelRunWire) -> Result<Self, Self::Error> {
        let created_at = wire
            .created_at
            .or(wire.created_at_camel)
            .ok_or("missing field `created_at`")?;
        let updated_at = wire
            .updated_at
            .or(wire.updated_at_camel)
            .ok_or("missing field `updated_at`")?;
        Ok(Self {
            id: wire.id,
            model_id: wire.model_id,
            model_name: wire.model_name,
            model_type: wire.model_type,
            model_engine: wire.model_engine,
            state: wire.state,
            input_features: wire.input_features,
            input_file: wire.input_file,
            result: wire.result,
            logs: wire.logs,
            container_id: wire.container_id,
            container_exit_code: wire.container_exit_code,
            created_at,
            updated_at,
        })
    }
}

impl ModelRun {
    /// Time between creation and the last update, never negative.
    pub fn duration(&self) -> Duration {
        (self.updated_at - self.created_at).max(Duration::zero())
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration().num_milliseconds()
    }
}

/// Render milliseconds as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_duration(ms: i64) -> String {
    let ms = ms.max(0);
    let days = ms / 86_400_000;
    let hours = (ms % 86_400_000) / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || hours > 0 || days > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Local-time rendering used by every table.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format("%H:%M, %d %b, %Y")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_json(state: &str) -> serde_json::Value {
        json!({
            "_id": "r1",
            "model_id": "m1",
            "model_name": "churn",
            "model_type": "predictive",
            "model_engine": "docker",
            "state": state,
            "input_features": [{"name": "age", "value": 31}],
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:01:05.500Z"
        })
    }

    #[test]
    fn glyph_mapping_is_total() {
        assert_eq!(RunState::from("finished").glyph(), StatusGlyph::Success);
        assert_eq!(RunState::from("failed").glyph(), StatusGlyph::Failure);
        for label in ["queued", "running", "pending", "", "FINISHED", "cancelled"] {
            assert_eq!(RunState::from(label).glyph(), StatusGlyph::Busy, "{label}");
        }
    }

    #[test]
    fn run_state_keeps_unknown_labels() {
        let state: RunState = serde_json::from_value(json!("provisioning")).unwrap();
        assert_eq!(state, RunState::InProgress("provisioning".into()));
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("provisioning"));
        assert_eq!(serde_json::to_value(RunState::Failed).unwrap(), json!("failed"));
    }

    #[test]
    fn run_accepts_camel_case_timestamps() {
        let run: ModelRun = serde_json::from_value(run_json("running")).unwrap();
        assert_eq!(run.id, "r1");
        assert_eq!(run.duration_ms(), 65_500);
        assert_eq!(run.input_features[0].value, FeatureValue::Int(31));
        assert!(!run.state.is_terminal());
    }

    #[test]
    fn run_with_both_timestamp_spellings_prefers_snake_case() {
        let mut value = run_json("running");
        value["created_at"] = json!("2024-05-01T10:00:30Z");
        value["updated_at"] = json!("2024-05-01T10:01:05.500Z");
        let run: ModelRun = serde_json::from_value(value).unwrap();
        assert_eq!(run.duration_ms(), 35_500);

        let model: Model = serde_json::from_value(json!({
            "_id": "m1",
            "name": "churn",
            "type": "predictive",
            "engine": "docker",
            "created_at": "2024-05-01T10:00:00Z",
            "createdAt": "2024-04-30T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(model.created_at.map(|t| t.to_rfc3339()), Some("2024-05-01T10:00:00+00:00".into()));
    }

    #[test]
    fn run_without_timestamps_is_rejected() {
        let mut value = run_json("running");
        value.as_object_mut().unwrap().remove("createdAt");
        let err = serde_json::from_value::<ModelRun>(value).unwrap_err();
        assert!(err.to_string().contains("created_at"), "{err}");
    }

    #[test]
    fn odd_input_values_do_not_break_the_run_list() {
        let mut odd = run_json("finished");
        odd["_id"] = json!("r2");
        odd["input_features"] = json!([
            {"name": "age", "value": null},
            {"name": "tags", "value": ["a", "b"]}
        ]);
        let runs: Vec<ModelRun> = serde_json::from_value(json!([run_json("running"), odd])).unwrap();
        assert_eq!(runs.len(), 2);
        let inputs = &runs[1].input_features;
        assert_eq!(inputs[0].value, FeatureValue::Null);
        assert_eq!(inputs[0].value.to_string(), "");
        assert_eq!(inputs[1].value.to_string(), r#"["a","b"]"#);
    }

    #[test]
    fn duration_is_never_negative() {
        let mut value = run_json("finished");
        value["updatedAt"] = json!("2024-05-01T09:59:00Z");
        let run: ModelRun = serde_json::from_value(value).unwrap();
        assert_eq!(run.duration_ms(), 0);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(65_500), "1m 5s");
        assert_eq!(format_duration(3_600_000), "1h 0m 0s");
        assert_eq!(format_duration(90_061_000), "1d 1h 1m 1s");
    }

    #[test]
    fn model_parses_backend_shape() {
        let model: Model = serde_json::from_value(json!({
            "_id": "m1",
            "name": "churn",
            "type": "predictive",
            "engine": "docker",
            "language": "Python3",
            "docker_tag": "3.9",
            "mem_limit": "256M",
            "cpu_percentage": "50",
            "serialization": "joblib",
            "features": [
                {"name": "age", "type": "int", "order": 1},
                {"name": "vip", "type": "bool", "order": 2}
            ],
            "dependencies": [{"library": "scikit-learn", "version": "1.3.0"}],
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(model.limits.cpu_percentage, Some(50));
        assert_eq!(model.features[1].kind, FeatureType::Boolean);
        assert_eq!(model.language.map(|l| l.path_segment()), Some("Python".into()));
    }

    #[test]
    fn r_is_predictive_only() {
        assert!(Language::R.supports(ModelType::Predictive));
        assert!(!Language::R.supports(ModelType::Optimization));
        assert_eq!(Language::R.default_docker_tag(), "4.1.3");
    }
}
