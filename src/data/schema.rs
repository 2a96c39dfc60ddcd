use serde::{Deserialize, Serialize};

/// Fixed column mapping shared by both sources and the merged table.
///
/// `primary_label`, `secondary_label`, `significance` and `detectors` name
/// columns of the *merged* table, i.e. after collision suffixes have been
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub join_key: String,
    /// Appended to a source-A column whose name also appears in source B.
    pub suffix_a: String,
    /// Appended to a source-B column whose name also appears in source A.
    pub suffix_b: String,
    pub primary_label: String,
    pub secondary_label: String,
    pub significance: String,
    pub detectors: String,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            join_key: "EventName".into(),
            suffix_a: "_x".into(),
            suffix_b: "_y".into(),
            primary_label: "HierarchicalClass".into(),
            secondary_label: "GDB_Class".into(),
            significance: "Significant".into(),
            detectors: "Detectors".into(),
        }
    }
}

impl Schema {
    /// Older exports: both sources carry `Object_Type`, keyed by `Event_ID`.
    ///
    /// A `Detectors` column is still required. Exports without one fail the
    /// load with a schema error naming it.
    pub fn legacy() -> Self {
        Schema {
            join_key: "Event_ID".into(),
            primary_label: "Object_Type_x".into(),
            secondary_label: "Object_Type_y".into(),
            significance: "Significance".into(),
            ..Schema::default()
        }
    }

    /// Resolve a preset name (`default`, `legacy`), case-insensitively.
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Some(Schema::default()),
            "legacy" => Some(Schema::legacy()),
            _ => None,
        }
    }
}
