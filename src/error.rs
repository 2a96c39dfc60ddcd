use thiserror::Error;

use crate::data::filter::SubselectionMode;

/// Failure while building the merged event table.
///
/// Both variants abort the load: no partial table is ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required column (the join key, or a typed column after the join)
    /// is missing.
    #[error("{origin}: missing required column '{column}'")]
    Schema { origin: String, column: String },

    /// A source could not be read or parsed as tabular data.
    #[error("{origin}: {reason}")]
    SourceRead { origin: String, reason: String },
}

impl LoadError {
    pub fn schema(origin: impl Into<String>, column: impl Into<String>) -> Self {
        LoadError::Schema {
            origin: origin.into(),
            column: column.into(),
        }
    }

    pub fn source_read(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::SourceRead {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

/// The criteria cannot drive the detector subselection for the chosen mode.
///
/// Callers present an empty result plus a warning and keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no detectors selected")]
    NoDetectorsSelected,

    #[error("'{mode}' needs at least {required} selected detectors, {selected} selected")]
    TooFewDetectors {
        mode: SubselectionMode,
        required: usize,
        selected: usize,
    },
}
