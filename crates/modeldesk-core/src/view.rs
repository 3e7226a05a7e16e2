//! Display-ready projections of runs for the list and detail screens.

use crate::models::{format_duration, format_timestamp, ModelRun, ModelType, RunState, StatusGlyph};

pub const NO_INPUT_FEATURES: &str = "No input features available";

/// One row of the run table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub id: String,
    pub model_id: String,
    pub model_name: String,
    pub model_type: String,
    pub model_engine: String,
    pub state: String,
    pub glyph: StatusGlyph,
    pub updated: String,
    pub duration_ms: i64,
    pub duration: String,
}

impl From<&ModelRun> for RunRow {
    fn from(run: &ModelRun) -> Self {
        let duration_ms = run.duration_ms();
        Self {
            id: run.id.clone(),
            model_id: run.model_id.clone(),
            model_name: run.model_name.clone().unwrap_or_default(),
            model_type: run.model_type.map(|t| t.to_string()).unwrap_or_default(),
            model_engine: run.model_engine.map(|e| e.to_string()).unwrap_or_default(),
            state: run.state.label().to_string(),
            glyph: run.state.glyph(),
            updated: format_timestamp(&run.updated_at),
            duration_ms,
            duration: format_duration(duration_ms),
        }
    }
}

/// The outcome section of the detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Result(String),
    Logs(String),
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputTable {
    Rows(Vec<(String, String)>),
    /// Shown as a single placeholder row.
    Empty,
}

/// A run together with the type of its model.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDetail {
    pub run: ModelRun,
    pub model_type: ModelType,
}

impl RunDetail {
    pub fn new(run: ModelRun, model_type: ModelType) -> Self {
        Self { run, model_type }
    }

    /// Container id and exit code mean something only after the run ended.
    pub fn show_container(&self) -> bool {
        self.run.state.is_terminal()
    }

    pub fn created(&self) -> String {
        format_timestamp(&self.run.created_at)
    }

    pub fn updated(&self) -> String {
        format_timestamp(&self.run.updated_at)
    }

    pub fn outcome(&self) -> RunOutcome {
        match &self.run.state {
            RunState::Finished => RunOutcome::Result(payload_text(self.run.result.as_ref())),
            RunState::Failed => RunOutcome::Logs(payload_text(self.run.logs.as_ref())),
            RunState::InProgress(_) => RunOutcome::Pending,
        }
    }

    /// `None` for optimization runs, which take an archive instead.
    pub fn input_table(&self) -> Option<InputTable> {
        if self.model_type == ModelType::Optimization {
            return None;
        }
        let features = &self.run.input_features;
        if features.is_empty() {
            return Some(InputTable::Empty);
        }
        Some(InputTable::Rows(
            features
                .iter()
                .map(|f| (f.name.clone(), f.value.to_string()))
                .collect(),
        ))
    }
}

/// Strings are shown as-is, anything else as indented JSON.
fn payload_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(state: &str, extra: serde_json::Value) -> ModelRun {
        let mut body = json!({
            "_id": "r1",
            "model_id": "m1",
            "model_name": "churn",
            "model_type": "predictive",
            "model_engine": "docker",
            "state": state,
            "container_id": "c0ffee",
            "container_exit_code": 0,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T11:01:05Z"
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn row_projection() {
        let row = RunRow::from(&run("running", json!({})));
        assert_eq!(row.model_name, "churn");
        assert_eq!(row.model_type, "predictive");
        assert_eq!(row.duration, "1h 1m 5s");
        assert_eq!(row.duration_ms, 3_665_000);
        assert_eq!(row.glyph, StatusGlyph::Busy);
    }

    #[test]
    fn container_only_when_terminal() {
        let detail = RunDetail::new(run("queued", json!({})), ModelType::Predictive);
        assert!(!detail.show_container());
        assert_eq!(detail.outcome(), RunOutcome::Pending);
        let detail = RunDetail::new(run("failed", json!({})), ModelType::Predictive);
        assert!(detail.show_container());
    }

    #[test]
    fn outcome_by_state() {
        let finished = RunDetail::new(
            run("finished", json!({"result": {"score": 1}})),
            ModelType::Predictive,
        );
        assert_eq!(finished.outcome(), RunOutcome::Result("{\n  \"score\": 1\n}".into()));
        let failed = RunDetail::new(
            run("failed", json!({"logs": "Traceback"})),
            ModelType::Predictive,
        );
        assert_eq!(failed.outcome(), RunOutcome::Logs("Traceback".into()));
    }

    #[test]
    fn input_table_depends_on_type() {
        let with_inputs = run(
            "finished",
            json!({"input_features": [{"name": "age", "value": 0}, {"name": "vip", "value": true}]}),
        );
        let detail = RunDetail::new(with_inputs.clone(), ModelType::Predictive);
        assert_eq!(
            detail.input_table(),
            Some(InputTable::Rows(vec![
                ("age".into(), "0".into()),
                ("vip".into(), "true".into())
            ]))
        );
        assert_eq!(RunDetail::new(with_inputs, ModelType::Optimization).input_table(), None);

        let empty = RunDetail::new(run("finished", json!({})), ModelType::Predictive);
        assert_eq!(empty.input_table(), Some(InputTable::Empty));
    }
}
