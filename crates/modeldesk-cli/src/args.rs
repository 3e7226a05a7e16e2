//! Value parsers for the flags that describe models and run inputs.

use modeldesk::model_form::FeatureDraft;
use modeldesk::{Dependency, Engine, FeatureType, Language, ModelSortKey, ModelType, RunSortKey, Serialization};

pub fn model_type(s: &str) -> Result<ModelType, String> {
    ModelType::parse(s).ok_or_else(|| format!("unknown model type '{s}' (predictive, optimization)"))
}

pub fn engine(s: &str) -> Result<Engine, String> {
    Engine::parse(s).ok_or_else(|| format!("unknown engine '{s}' (docker, test)"))
}

pub fn language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("unknown language '{s}' (Python3, R)"))
}

pub fn serialization(s: &str) -> Result<Serialization, String> {
    Serialization::parse(s).ok_or_else(|| format!("unknown serialization '{s}' (joblib, pickle)"))
}

pub fn run_sort_key(s: &str) -> Result<RunSortKey, String> {
    RunSortKey::parse(s).ok_or_else(|| format!("cannot sort runs by '{s}'"))
}

pub fn model_sort_key(s: &str) -> Result<ModelSortKey, String> {
    ModelSortKey::parse(s).ok_or_else(|| format!("cannot sort models by '{s}'"))
}

/// `name:type`, e.g. `age:int`. The type defaults to `int`.
pub fn feature(s: &str) -> Result<FeatureDraft, String> {
    let (name, kind) = match s.split_once(':') {
        Some((name, kind)) => (
            name,
            FeatureType::parse(kind).ok_or_else(|| format!("unknown feature type '{kind}'"))?,
        ),
        None => (s, FeatureType::Int),
    };
    if name.trim().is_empty() {
        return Err("feature name is empty".to_string());
    }
    Ok(FeatureDraft {
        name: name.trim().to_string(),
        kind,
    })
}

/// `library==version`, e.g. `scikit-learn==1.4.2`.
pub fn dependency(s: &str) -> Result<Dependency, String> {
    match s.split_once("==") {
        Some((library, version)) if !library.trim().is_empty() && !version.trim().is_empty() => {
            Ok(Dependency {
                library: library.trim().to_string(),
                version: version.trim().to_string(),
            })
        }
        _ => Err(format!("expected library==version, got '{s}'")),
    }
}

/// `name=value`; the value is coerced later against the model's schema.
pub fn input(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_features() {
        assert_eq!(
            feature("rate:float").unwrap(),
            FeatureDraft { name: "rate".into(), kind: FeatureType::Float }
        );
        assert_eq!(feature("age").unwrap().kind, FeatureType::Int);
        assert_eq!(feature("vip:bool").unwrap().kind, FeatureType::Boolean);
        assert!(feature(":int").is_err());
        assert!(feature("x:date").is_err());
    }

    #[test]
    fn parses_dependencies_and_inputs() {
        let dep = dependency("scikit-learn==1.4.2").unwrap();
        assert_eq!((dep.library.as_str(), dep.version.as_str()), ("scikit-learn", "1.4.2"));
        assert!(dependency("numpy").is_err());
        assert!(dependency("numpy==").is_err());

        assert_eq!(input("age=0").unwrap(), ("age".to_string(), "0".to_string()));
        assert_eq!(input("expr=a=b").unwrap().1, "a=b");
        assert!(input("=1").is_err());
    }
}
