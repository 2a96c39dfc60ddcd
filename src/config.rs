use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::data::schema::Schema;

pub const ENV_SOURCE_A: &str = "GWFILTER_SOURCE_A";
pub const ENV_SOURCE_B: &str = "GWFILTER_SOURCE_B";
pub const ENV_SCHEMA: &str = "GWFILTER_SCHEMA";

const DEFAULT_SOURCE_A: &str = "GraceDB.csv";
const DEFAULT_SOURCE_B: &str = "GWSkyNet.csv";

/// Startup configuration. Sources may also be picked later from the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub source_a: Option<PathBuf>,
    pub source_b: Option<PathBuf>,
    pub schema: Schema,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), |p| p.exists())
    }

    /// `lookup` resolves variables; `exists` decides whether the default
    /// source files are picked up when the variables are unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        exists: impl Fn(&Path) -> bool,
    ) -> Result<Self> {
        let source = |var: &str, default: &str| -> Option<PathBuf> {
            match lookup(var).filter(|v| !v.trim().is_empty()) {
                Some(v) => Some(PathBuf::from(v)),
                None => Some(PathBuf::from(default)).filter(|p| exists(p)),
            }
        };

        let schema = match lookup(ENV_SCHEMA) {
            None => Schema::default(),
            Some(value) => resolve_schema(&value)?,
        };

        Ok(AppConfig {
            source_a: source(ENV_SOURCE_A, DEFAULT_SOURCE_A),
            source_b: source(ENV_SOURCE_B, DEFAULT_SOURCE_B),
            schema,
        })
    }
}

/// A preset name, or a path to a JSON file holding a [`Schema`].
fn resolve_schema(value: &str) -> Result<Schema> {
    if let Some(schema) = Schema::preset(value) {
        return Ok(schema);
    }
    let path = Path::new(value.trim());
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!("{ENV_SCHEMA}: '{value}' is neither a preset (default, legacy) nor a .json file");
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing schema file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn config(vars: &[(&str, &str)], files_exist: bool) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned(), |_| files_exist)
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[], false).unwrap();
        assert_eq!(cfg.source_a, None);
        assert_eq!(cfg.source_b, None);
        assert_eq!(cfg.schema, Schema::default());

        let cfg = config(&[], true).unwrap();
        assert_eq!(cfg.source_a, Some(PathBuf::from("GraceDB.csv")));
        assert_eq!(cfg.source_b, Some(PathBuf::from("GWSkyNet.csv")));
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = config(
            &[
                (ENV_SOURCE_A, "/data/a.parquet"),
                (ENV_SOURCE_B, "/data/b.json"),
                (ENV_SCHEMA, "legacy"),
            ],
            false,
        )
        .unwrap();
        assert_eq!(cfg.source_a, Some(PathBuf::from("/data/a.parquet")));
        assert_eq!(cfg.source_b, Some(PathBuf::from("/data/b.json")));
        assert_eq!(cfg.schema, Schema::legacy());
    }

    #[test]
    fn schema_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{ "join_key": "Event_ID", "detectors": "IFOs" }"#).unwrap();

        let cfg = config(&[(ENV_SCHEMA, path.to_str().unwrap())], false).unwrap();
        assert_eq!(cfg.schema.join_key, "Event_ID");
        assert_eq!(cfg.schema.detectors, "IFOs");
        assert_eq!(cfg.schema.primary_label, Schema::default().primary_label);
    }

    #[test]
    fn unknown_schema_value_is_rejected() {
        assert!(config(&[(ENV_SCHEMA, "v3")], false).is_err());
        assert!(config(&[(ENV_SCHEMA, "/missing/schema.json")], false).is_err());
    }
}
