//! Terminal rendering of the console's tables and detail panes.

use std::fmt::Write;

use comfy_table::{presets::UTF8_FULL, Table};
use modeldesk::view::{InputTable, RunOutcome, NO_INPUT_FEATURES};
use modeldesk::{format_timestamp, Model, ModelSortKey, RunDetail, RunRow, RunSortKey, SortConfig};

fn header(label: &str, arrow: &str) -> String {
    if arrow.is_empty() {
        label.to_string()
    } else {
        format!("{label} {arrow}")
    }
}

pub fn models_table(models: &[Model], sort: &SortConfig<ModelSortKey>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut headers = vec!["ID".to_string()];
    headers.extend(ModelSortKey::ALL.iter().map(|k| header(k.label(), sort.arrow(*k))));
    table.set_header(headers);

    for model in models {
        table.add_row([
            model.id.clone(),
            model.name.clone(),
            model.model_type.to_string(),
            model.engine.to_string(),
            model.created_at.as_ref().map(format_timestamp).unwrap_or_default(),
        ]);
    }
    table
}

pub fn runs_table(rows: &[RunRow], sort: &SortConfig<RunSortKey>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut headers = vec!["Run ID".to_string()];
    headers.extend(RunSortKey::ALL.iter().map(|k| header(k.label(), sort.arrow(*k))));
    table.set_header(headers);

    for row in rows {
        table.add_row([
            row.id.clone(),
            row.model_name.clone(),
            row.model_type.clone(),
            row.model_engine.clone(),
            row.updated.clone(),
            row.duration.clone(),
            format!("{} {}", row.glyph.symbol(), row.state),
        ]);
    }
    table
}

pub fn model_detail(model: &Model) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── Model {} ──────────────────────", model.name);
    let _ = writeln!(out, "  ID:        {}", model.id);
    let _ = writeln!(out, "  Type:      {}", model.model_type);
    let _ = writeln!(out, "  Engine:    {}", model.engine);
    if let Some(language) = model.language {
        let tag = model.docker_tag.as_deref().unwrap_or("-");
        let _ = writeln!(out, "  Runtime:   {language} ({tag})");
    }
    if let Some(mem) = &model.limits.mem_limit {
        let _ = writeln!(out, "  Memory:    {mem}");
    }
    if let Some(cpu) = model.limits.cpu_percentage {
        let _ = writeln!(out, "  CPU:       {cpu}%");
    }
    if let Some(created) = &model.created_at {
        let _ = writeln!(out, "  Created:   {}", format_timestamp(created));
    }

    if !model.features.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(["Feature", "Type"]);
        for f in &model.features {
            table.add_row([f.name.as_str(), f.kind.as_str()]);
        }
        let _ = writeln!(out, "{table}");
    }
    if !model.dependencies.is_empty() {
        let _ = writeln!(out, "  Dependencies:");
        for d in &model.dependencies {
            let _ = writeln!(out, "    {}=={}", d.library, d.version);
        }
    }
    out
}

pub fn run_detail(detail: &RunDetail) -> String {
    let run = &detail.run;
    let mut out = String::new();
    let _ = writeln!(out, "── Run {} ──────────────────────", run.id);
    let _ = writeln!(out, "  Model ID:  {}", run.model_id);
    let _ = writeln!(out, "  State:     {} {}", run.state.glyph().symbol(), run.state);
    let _ = writeln!(out, "  Created:   {}", detail.created());
    let _ = writeln!(out, "  Updated:   {}", detail.updated());
    if detail.show_container() {
        let _ = writeln!(out, "  Container: {}", run.container_id.as_deref().unwrap_or("-"));
        let code = run
            .container_exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  Exit code: {code}");
    }

    if let Some(inputs) = detail.input_table() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(["Input", "Value"]);
        match inputs {
            InputTable::Rows(rows) => {
                for (name, value) in rows {
                    table.add_row([name, value]);
                }
            }
            InputTable::Empty => {
                table.add_row([NO_INPUT_FEATURES, ""]);
            }
        }
        let _ = writeln!(out, "{table}");
    }

    match detail.outcome() {
        RunOutcome::Result(text) => {
            let _ = writeln!(out, "── Result ──\n{text}");
        }
        RunOutcome::Logs(text) => {
            let _ = writeln!(out, "── Logs ──\n{text}");
        }
        RunOutcome::Pending => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeldesk::{ModelRun, ModelType, SortDirection};
    use serde_json::json;

    fn run(state: &str) -> ModelRun {
        serde_json::from_value(json!({
            "_id": "r1",
            "model_id": "m1",
            "model_name": "churn",
            "model_type": "predictive",
            "model_engine": "docker",
            "state": state,
            "input_features": [],
            "container_id": "c0ffee",
            "container_exit_code": 1,
            "logs": "boom",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:42Z"
        }))
        .unwrap()
    }

    #[test]
    fn run_table_marks_sorted_column() {
        let rows = vec![RunRow::from(&run("running"))];
        let sort = SortConfig::new(RunSortKey::Duration, SortDirection::Asc);
        let text = runs_table(&rows, &sort).to_string();
        assert!(text.contains("Duration ↑"));
        assert!(text.contains("42s"));
        assert!(text.contains("⟳ running"));
    }

    #[test]
    fn failed_run_shows_container_and_logs() {
        let text = run_detail(&RunDetail::new(run("failed"), ModelType::Predictive));
        assert!(text.contains("Container: c0ffee"));
        assert!(text.contains("Exit code: 1"));
        assert!(text.contains(NO_INPUT_FEATURES));
        assert!(text.contains("boom"));
    }

    #[test]
    fn pending_optimization_run_hides_sections() {
        let text = run_detail(&RunDetail::new(run("queued"), ModelType::Optimization));
        assert!(!text.contains("Container:"));
        assert!(!text.contains("Input"));
        assert!(!text.contains("Logs"));
    }
}
