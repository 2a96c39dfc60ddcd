use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Value – a single cell in a source or merged table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            // FARs sit around 1e-12..1e-3 and must not collapse to zero.
            Value::Float(v) if *v != 0.0 && v.abs() < 1e-3 => write!(f, "{v:.4e}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64` for plot axes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Exact textual form used for join-key comparison. `None` for Null.
    ///
    /// Floats use the shortest round-trip form, not the 4-digit display form.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

// ---------------------------------------------------------------------------
// Table – one raw tabular source, before the join
// ---------------------------------------------------------------------------

/// Header plus rows, in file order. Every row has `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Typed event fields
// ---------------------------------------------------------------------------

/// Classification label assigned by either classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Glitch,
    Bbh,
    Ns,
    Other,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::Glitch, Label::Bbh, Label::Ns, Label::Other];

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => s.parse().unwrap_or(Label::Other),
            _ => Label::Other,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Label::Glitch => "Glitch",
            Label::Bbh => "BBH",
            Label::Ns => "NS",
            Label::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Unrecognised text maps to [`Label::Other`]; parsing never fails.
impl FromStr for Label {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = match s.trim().to_ascii_lowercase().as_str() {
            "glitch" => Label::Glitch,
            "bbh" => Label::Bbh,
            "ns" => Label::Ns,
            _ => Label::Other,
        };
        Ok(label)
    }
}

/// Significance flag. Sources store it as `High`/`Low` or as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Significance {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised significance value '{0}'")]
pub struct ParseSignificanceError(pub String);

impl Significance {
    pub const ALL: [Significance; 2] = [Significance::High, Significance::Low];

    pub fn from_value(value: &Value) -> Result<Self, ParseSignificanceError> {
        match value {
            Value::Bool(true) | Value::Integer(1) => Ok(Significance::High),
            Value::Bool(false) | Value::Integer(0) => Ok(Significance::Low),
            Value::String(s) => s.parse(),
            other => Err(ParseSignificanceError(other.to_string())),
        }
    }

    pub fn is_high(self) -> bool {
        self == Significance::High
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::High => f.write_str("High"),
            Significance::Low => f.write_str("Low"),
        }
    }
}

impl FromStr for Significance {
    type Err = ParseSignificanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "true" | "1" => Ok(Significance::High),
            "low" | "false" | "0" => Ok(Significance::Low),
            _ => Err(ParseSignificanceError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectorSet – which instruments observed an event
// ---------------------------------------------------------------------------

/// Set of single-letter detector codes (`H`, `L`, `V`, ...).
///
/// Membership is decided on the parsed set, never by substring search
/// on the original cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DetectorSet(BTreeSet<char>);

impl DetectorSet {
    pub fn new() -> Self {
        DetectorSet(BTreeSet::new())
    }

    /// Inserts a code, normalised to upper case. Non-letters are ignored.
    pub fn insert(&mut self, code: char) -> bool {
        if !code.is_ascii_alphabetic() {
            return false;
        }
        self.0.insert(code.to_ascii_uppercase())
    }

    pub fn remove(&mut self, code: char) -> bool {
        self.0.remove(&code.to_ascii_uppercase())
    }

    pub fn contains(&self, code: char) -> bool {
        self.0.contains(&code.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `|self ∩ other|`
    pub fn overlap(&self, other: &DetectorSet) -> usize {
        self.0.intersection(&other.0).count()
    }

    pub fn is_subset(&self, other: &DetectorSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn union_with(&mut self, other: &DetectorSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => s.parse().unwrap_or_default(),
            _ => DetectorSet::new(),
        }
    }
}

impl FromIterator<char> for DetectorSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut set = DetectorSet::new();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

/// Every ASCII letter in the text is one detector code, so `"H1,L1"`,
/// `"HL"` and `"{H, V}"` all parse. Never fails.
impl FromStr for DetectorSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.chars().collect())
    }
}

impl fmt::Display for DetectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for code in &self.0 {
            write!(f, "{code}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EventRecord / EventTable – the merged, typed table
// ---------------------------------------------------------------------------

/// One row of the merged table.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: String,
    pub primary_label: Label,
    pub secondary_label: Label,
    pub significance: Significance,
    pub detectors: DetectorSet,
    /// All merged cells, aligned with [`EventTable::columns`].
    pub values: Vec<Value>,
}

impl EventRecord {
    /// Both classifiers assigned the same label.
    pub fn labels_agree(&self) -> bool {
        self.primary_label == self.secondary_label
    }
}

/// The merged table. Built once per load and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    /// Merged column names, join key first.
    pub columns: Vec<String>,
    /// Records in join order.
    pub records: Vec<EventRecord>,
    /// Name of the join-key column (`columns[0]` for loaded tables).
    pub key_column: String,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `record` under column `name`.
    pub fn value<'a>(&self, record: &'a EventRecord, name: &str) -> Option<&'a Value> {
        self.column_index(name).and_then(|i| record.values.get(i))
    }

    /// Columns usable as plot axes: every non-null cell is numeric and at
    /// least one cell is present. The join key is never listed.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, name)| **name != self.key_column)
            .filter(|(idx, _)| {
                let mut seen = false;
                for record in &self.records {
                    match record.values.get(*idx) {
                        Some(v) if v.is_numeric() => seen = true,
                        Some(Value::Null) | None => {}
                        Some(_) => return false,
                    }
                }
                seen
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Union of every record's detectors.
    pub fn detector_codes(&self) -> DetectorSet {
        let mut all = DetectorSet::new();
        for record in &self.records {
            all.union_with(&record.detectors);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_set_parses_common_spellings() {
        let expected: DetectorSet = ['H', 'L'].into_iter().collect();
        assert_eq!("HL".parse::<DetectorSet>().unwrap(), expected);
        assert_eq!("H1,L1".parse::<DetectorSet>().unwrap(), expected);
        assert_eq!("{l, h}".parse::<DetectorSet>().unwrap(), expected);
        assert!("".parse::<DetectorSet>().unwrap().is_empty());
    }

    #[test]
    fn detector_set_overlap_and_subset() {
        let row: DetectorSet = "HL".parse().unwrap();
        let selected: DetectorSet = "HLV".parse().unwrap();
        assert_eq!(row.overlap(&selected), 2);
        assert!(row.is_subset(&selected));
        assert!(!selected.is_subset(&row));
        assert_eq!(selected.to_string(), "HLV");
    }

    #[test]
    fn label_parsing_is_case_insensitive_with_other_fallback() {
        assert_eq!("bbh".parse::<Label>().unwrap(), Label::Bbh);
        assert_eq!(" NS ".parse::<Label>().unwrap(), Label::Ns);
        assert_eq!("Glitch".parse::<Label>().unwrap(), Label::Glitch);
        assert_eq!("NSBH".parse::<Label>().unwrap(), Label::Other);
        assert_eq!(Label::from_value(&Value::Integer(3)), Label::Other);
    }

    #[test]
    fn significance_accepts_enum_and_boolean_forms() {
        assert_eq!(
            Significance::from_value(&Value::Bool(true)).unwrap(),
            Significance::High
        );
        assert_eq!(
            Significance::from_value(&Value::Integer(0)).unwrap(),
            Significance::Low
        );
        assert_eq!("High".parse::<Significance>().unwrap(), Significance::High);
        assert_eq!("false".parse::<Significance>().unwrap(), Significance::Low);
        assert!(Significance::from_value(&Value::Null).is_err());
        assert!("maybe".parse::<Significance>().is_err());
    }

    #[test]
    fn small_floats_display_in_scientific_notation() {
        assert_eq!(Value::Float(1.5e-9).to_string(), "1.5000e-9");
        assert_eq!(Value::Float(-2.25e-4).to_string(), "-2.2500e-4");
        assert_eq!(Value::Float(0.0).to_string(), "0.0000");
        assert_eq!(Value::Float(35.0).to_string(), "35.0000");
        assert_eq!(Value::Float(0.001).to_string(), "0.0010");
    }

    #[test]
    fn float_keys_are_not_rounded() {
        assert_eq!(Value::Float(1.23456789).as_key().unwrap(), "1.23456789");
        assert_eq!(Value::Null.as_key(), None);
    }
}
