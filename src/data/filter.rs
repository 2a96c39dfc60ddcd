use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::model::{DetectorSet, EventRecord, EventTable, Label, Significance};
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Subselection mode
// ---------------------------------------------------------------------------

/// How many of the selected detectors a row must have observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubselectionMode {
    #[default]
    AnyOne,
    ExactlyOne,
    AnyTwo,
    ExactlyTwo,
    AllThree,
}

impl SubselectionMode {
    pub const ALL: [SubselectionMode; 5] = [
        SubselectionMode::AnyOne,
        SubselectionMode::ExactlyOne,
        SubselectionMode::AnyTwo,
        SubselectionMode::ExactlyTwo,
        SubselectionMode::AllThree,
    ];

    /// Fewest selected detectors this mode accepts.
    pub fn min_selected(self) -> usize {
        match self {
            SubselectionMode::AnyOne | SubselectionMode::ExactlyOne => 1,
            SubselectionMode::AnyTwo | SubselectionMode::ExactlyTwo => 2,
            SubselectionMode::AllThree => 3,
        }
    }

    /// Detector predicate for one row.
    pub fn keeps(self, selected: &DetectorSet, observed: &DetectorSet) -> bool {
        let overlap = selected.overlap(observed);
        match self {
            SubselectionMode::AnyOne => overlap >= 1,
            SubselectionMode::ExactlyOne => overlap == 1,
            SubselectionMode::AnyTwo => overlap >= 2,
            SubselectionMode::ExactlyTwo => overlap == 2,
            SubselectionMode::AllThree => selected.len() == 3 && selected.is_subset(observed),
        }
    }
}

impl fmt::Display for SubselectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubselectionMode::AnyOne => "Any one",
            SubselectionMode::ExactlyOne => "Exactly one",
            SubselectionMode::AnyTwo => "Any two",
            SubselectionMode::ExactlyTwo => "Exactly two",
            SubselectionMode::AllThree => "All three",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subselection mode '{0}'")]
pub struct ParseModeError(pub String);

/// Accepts `AnyOne`, `any one`, `any_one`, `Any-One`, ...
impl FromStr for SubselectionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalised.as_str() {
            "anyone" => Ok(SubselectionMode::AnyOne),
            "exactlyone" => Ok(SubselectionMode::ExactlyOne),
            "anytwo" => Ok(SubselectionMode::AnyTwo),
            "exactlytwo" => Ok(SubselectionMode::ExactlyTwo),
            "allthree" => Ok(SubselectionMode::AllThree),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Immutable criteria for one filter invocation.
///
/// An empty label or significance set matches no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub primary_labels: BTreeSet<Label>,
    pub secondary_labels: BTreeSet<Label>,
    pub significance: BTreeSet<Significance>,
    pub detectors: DetectorSet,
    pub mode: SubselectionMode,
}

impl Default for FilterCriteria {
    /// BBH and NS from both classifiers, high significance, any of H/L/V.
    fn default() -> Self {
        FilterCriteria {
            primary_labels: [Label::Bbh, Label::Ns].into(),
            secondary_labels: [Label::Bbh, Label::Ns].into(),
            significance: [Significance::High].into(),
            detectors: "HLV".chars().collect(),
            mode: SubselectionMode::AnyOne,
        }
    }
}

impl FilterCriteria {
    /// Check the detector selection against the mode's minimum.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let selected = self.detectors.len();
        if selected == 0 {
            return Err(ValidationError::NoDetectorsSelected);
        }
        let required = self.mode.min_selected();
        if selected < required {
            return Err(ValidationError::TooFewDetectors {
                mode: self.mode,
                required,
                selected,
            });
        }
        Ok(())
    }

    /// Conjunction of the label, significance and detector predicates.
    /// Only meaningful after [`FilterCriteria::validate`] succeeded.
    pub fn matches(&self, record: &EventRecord) -> bool {
        self.primary_labels.contains(&record.primary_label)
            && self.secondary_labels.contains(&record.secondary_label)
            && self.significance.contains(&record.significance)
            && self.mode.keeps(&self.detectors, &record.detectors)
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Indices of records passing `criteria`, in table order.
pub fn filtered_indices(
    table: &EventTable,
    criteria: &FilterCriteria,
) -> Result<Vec<usize>, ValidationError> {
    criteria.validate()?;
    let indices: Vec<usize> = table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect();
    log::debug!("filter kept {} of {} events", indices.len(), table.len());
    Ok(indices)
}

/// Apply `criteria` to `table`, producing an ordered read-only view.
pub fn filter<'a>(
    table: &'a EventTable,
    criteria: &FilterCriteria,
) -> Result<FilteredView<'a>, ValidationError> {
    let indices = filtered_indices(table, criteria)?;
    Ok(FilteredView { table, indices })
}

/// Ordered subset of an [`EventTable`].
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a EventTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over `table` with the given row indices.
    pub fn new(table: &'a EventTable, indices: Vec<usize>) -> Self {
        FilteredView { table, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn columns(&self) -> &'a [String] {
        &self.table.columns
    }

    pub fn table(&self) -> &'a EventTable {
        self.table
    }

    pub fn records(&self) -> impl Iterator<Item = &'a EventRecord> + Clone + '_ {
        let table = self.table;
        self.indices.iter().map(move |&i| &table.records[i])
    }

    /// Give up the view, keeping its row indices.
    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    /// Copy the visible rows into a standalone table.
    pub fn to_table(&self) -> EventTable {
        EventTable {
            columns: self.table.columns.clone(),
            records: self.records().cloned().collect(),
            key_column: self.table.key_column.clone(),
        }
    }
}
