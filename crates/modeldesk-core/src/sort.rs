//! Column sorting shared by the model and run tables.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{Model, ModelRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort column and direction of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortConfig<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Header click: flips an ascending sort on the same column, otherwise
    /// sorts ascending by `key`.
    pub fn toggle(&mut self, key: K) {
        self.direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.key = key;
    }

    pub fn arrow(&self, key: K) -> &'static str {
        if self.key != key {
            return "";
        }
        match self.direction {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

/// Three-way comparison: equal (or incomparable) values are `Equal`,
/// otherwise the ascending order, flipped for descending.
pub fn compare<T: PartialOrd + ?Sized>(a: &T, b: &T, direction: SortDirection) -> Ordering {
    let asc = if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    };
    match direction {
        SortDirection::Asc => asc,
        SortDirection::Desc => asc.reverse(),
    }
}

/// A sortable cell value. Missing values sort before present ones.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum SortValue {
    Missing,
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn text(value: Option<impl Into<String>>) -> Self {
        value.map_or(SortValue::Missing, |v| SortValue::Text(v.into()))
    }
}

pub trait Sortable<K> {
    fn sort_value(&self, key: K) -> SortValue;
}

/// Stable in-place sort: rows with equal keys keep their relative order.
pub fn sort_rows<T, K>(rows: &mut [T], config: &SortConfig<K>)
where
    T: Sortable<K>,
    K: Copy,
{
    rows.sort_by(|a, b| {
        compare(
            &a.sort_value(config.key),
            &b.sort_value(config.key),
            config.direction,
        )
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunSortKey {
    ModelName,
    ModelType,
    ModelEngine,
    UpdatedAt,
    Duration,
    State,
}

impl RunSortKey {
    pub const ALL: [RunSortKey; 6] = [
        RunSortKey::ModelName,
        RunSortKey::ModelType,
        RunSortKey::ModelEngine,
        RunSortKey::UpdatedAt,
        RunSortKey::Duration,
        RunSortKey::State,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RunSortKey::ModelName => "Model Name",
            RunSortKey::ModelType => "Type",
            RunSortKey::ModelEngine => "Engine",
            RunSortKey::UpdatedAt => "Last Updated On",
            RunSortKey::Duration => "Duration",
            RunSortKey::State => "State",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "model_name" | "name" => Some(RunSortKey::ModelName),
            "model_type" | "type" => Some(RunSortKey::ModelType),
            "model_engine" | "engine" => Some(RunSortKey::ModelEngine),
            "updated_at" | "updated" => Some(RunSortKey::UpdatedAt),
            "duration" => Some(RunSortKey::Duration),
            "state" => Some(RunSortKey::State),
            _ => None,
        }
    }
}

/// Newest activity first.
impl Default for SortConfig<RunSortKey> {
    fn default() -> Self {
        SortConfig::new(RunSortKey::UpdatedAt, SortDirection::Desc)
    }
}

impl Sortable<RunSortKey> for ModelRun {
    fn sort_value(&self, key: RunSortKey) -> SortValue {
        match key {
            RunSortKey::ModelName => SortValue::text(self.model_name.clone()),
            RunSortKey::ModelType => SortValue::text(self.model_type.map(|t| t.as_str())),
            RunSortKey::ModelEngine => SortValue::text(self.model_engine.map(|e| e.as_str())),
            RunSortKey::UpdatedAt => SortValue::Time(self.updated_at),
            RunSortKey::Duration => SortValue::Int(self.duration_ms()),
            RunSortKey::State => SortValue::Text(self.state.label().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSortKey {
    Name,
    Type,
    Engine,
    CreatedAt,
}

impl ModelSortKey {
    pub const ALL: [ModelSortKey; 4] = [
        ModelSortKey::Name,
        ModelSortKey::Type,
        ModelSortKey::Engine,
        ModelSortKey::CreatedAt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModelSortKey::Name => "Name",
            ModelSortKey::Type => "Type",
            ModelSortKey::Engine => "Engine",
            ModelSortKey::CreatedAt => "Created At",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(ModelSortKey::Name),
            "type" => Some(ModelSortKey::Type),
            "engine" => Some(ModelSortKey::Engine),
            "created_at" | "created" => Some(ModelSortKey::CreatedAt),
            _ => None,
        }
    }
}

impl Default for SortConfig<ModelSortKey> {
    fn default() -> Self {
        SortConfig::new(ModelSortKey::CreatedAt, SortDirection::Desc)
    }
}

impl Sortable<ModelSortKey> for Model {
    fn sort_value(&self, key: ModelSortKey) -> SortValue {
        match key {
            ModelSortKey::Name => SortValue::Text(self.name.clone()),
            ModelSortKey::Type => SortValue::Text(self.model_type.as_str().to_string()),
            ModelSortKey::Engine => SortValue::Text(self.engine.as_str().to_string()),
            ModelSortKey::CreatedAt => self.created_at.map_or(SortValue::Missing, SortValue::Time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunState;
    use chrono::TimeZone;

    fn run(id: &str, name: &str, state: &str, secs: i64) -> ModelRun {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        ModelRun {
            id: id.to_string(),
            model_id: "m".to_string(),
            model_name: Some(name.to_string()),
            model_type: None,
            model_engine: None,
            state: RunState::from(state),
            input_features: vec![],
            input_file: None,
            result: None,
            logs: None,
            container_id: None,
            container_exit_code: None,
            created_at: created,
            updated_at: created + chrono::Duration::seconds(secs),
        }
    }

    fn ids(runs: &[ModelRun]) -> Vec<&str> {
        runs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn toggle_flips_only_same_ascending_key() {
        let mut cfg = SortConfig::<RunSortKey>::default();
        cfg.toggle(RunSortKey::UpdatedAt);
        assert_eq!(cfg.direction, SortDirection::Asc);
        cfg.toggle(RunSortKey::UpdatedAt);
        assert_eq!(cfg.direction, SortDirection::Desc);
        cfg.toggle(RunSortKey::Duration);
        assert_eq!(cfg, SortConfig::new(RunSortKey::Duration, SortDirection::Asc));
        assert_eq!(cfg.arrow(RunSortKey::Duration), "↑");
        assert_eq!(cfg.arrow(RunSortKey::State), "");
    }

    #[test]
    fn descending_reverses_ascending() {
        let mut runs = vec![
            run("a", "x", "running", 30),
            run("b", "x", "running", 5),
            run("c", "x", "running", 120),
            run("d", "x", "running", 61),
        ];
        let mut cfg = SortConfig::new(RunSortKey::Duration, SortDirection::Asc);
        sort_rows(&mut runs, &cfg);
        let asc: Vec<String> = ids(&runs).into_iter().map(String::from).collect();
        assert_eq!(asc, ["b", "a", "d", "c"]);

        cfg.toggle(RunSortKey::Duration);
        sort_rows(&mut runs, &cfg);
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(ids(&runs), reversed);
    }

    #[test]
    fn ties_keep_relative_order() {
        let mut runs = vec![
            run("1", "beta", "finished", 1),
            run("2", "alpha", "failed", 2),
            run("3", "beta", "queued", 3),
            run("4", "alpha", "running", 4),
        ];
        sort_rows(&mut runs, &SortConfig::new(RunSortKey::ModelName, SortDirection::Asc));
        assert_eq!(ids(&runs), ["2", "4", "1", "3"]);
        sort_rows(&mut runs, &SortConfig::new(RunSortKey::ModelName, SortDirection::Desc));
        assert_eq!(ids(&runs), ["1", "3", "2", "4"]);
    }

    #[test]
    fn missing_values_sort_first() {
        let mut anon = run("n", "", "queued", 0);
        anon.model_name = None;
        let mut runs = vec![run("a", "alpha", "queued", 0), anon];
        sort_rows(&mut runs, &SortConfig::new(RunSortKey::ModelName, SortDirection::Asc));
        assert_eq!(ids(&runs), ["n", "a"]);
    }

    #[test]
    fn compare_is_three_way() {
        assert_eq!(compare(&1, &1, SortDirection::Desc), Ordering::Equal);
        assert_eq!(compare(&1, &2, SortDirection::Asc), Ordering::Less);
        assert_eq!(compare(&1, &2, SortDirection::Desc), Ordering::Greater);
        assert_eq!(compare(&f64::NAN, &1.0, SortDirection::Asc), Ordering::Equal);
    }
}
