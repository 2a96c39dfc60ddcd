use std::path::PathBuf;

use crate::config::AppConfig;
use crate::data::filter::{FilterCriteria, FilteredView, SubselectionMode, filter};
use crate::data::loader::load_sources;
use crate::data::model::{DetectorSet, EventTable, Label, Significance};
use crate::data::schema::Schema;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which classifier's label set a toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Primary,
    Secondary,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub schema: Schema,
    pub source_a: Option<PathBuf>,
    pub source_b: Option<PathBuf>,

    /// Merged table (None until both sources loaded successfully).
    pub table: Option<EventTable>,

    /// Current criteria, rebuilt from widget changes.
    pub criteria: FilterCriteria,

    /// Indices of events passing the current criteria (cached).
    pub visible_indices: Vec<usize>,

    /// Detector codes offered as checkboxes.
    pub available_detectors: DetectorSet,

    /// Columns offered for the X/Y axes.
    pub numeric_columns: Vec<String>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,

    /// Validation warning for the current criteria.
    pub warning: Option<String>,

    /// Load / configuration error shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build state from configuration and load the sources it names.
    pub fn new(config: AppConfig) -> Self {
        let mut state = Self {
            schema: config.schema,
            source_a: config.source_a,
            source_b: config.source_b,
            table: None,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            available_detectors: FilterCriteria::default().detectors,
            numeric_columns: Vec::new(),
            x_column: None,
            y_column: None,
            warning: None,
            status_message: None,
        };
        state.reload();
        state
    }

    pub fn set_source_a(&mut self, path: PathBuf) {
        self.source_a = Some(path);
        self.reload();
    }

    pub fn set_source_b(&mut self, path: PathBuf) {
        self.source_b = Some(path);
        self.reload();
    }

    /// Load both sources if both are known. A failed load clears the table.
    pub fn reload(&mut self) {
        let (Some(a), Some(b)) = (&self.source_a, &self.source_b) else {
            return;
        };
        match load_sources(a, b, &self.schema) {
            Ok(table) => self.set_table(table),
            Err(e) => {
                log::error!("Failed to load sources: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.table = None;
                self.visible_indices.clear();
                self.numeric_columns.clear();
            }
        }
    }

    /// Ingest a newly merged table, reset axes and recompute the view.
    ///
    /// Every observed detector is offered and selected.
    pub fn set_table(&mut self, table: EventTable) {
        let observed = table.detector_codes();
        if !observed.is_empty() {
            self.available_detectors = observed;
        }
        self.criteria.detectors = self.available_detectors.clone();
        self.numeric_columns = table.numeric_columns();
        self.x_column = self.numeric_columns.first().cloned();
        self.y_column = self
            .numeric_columns
            .get(1)
            .or_else(|| self.numeric_columns.first())
            .cloned();

        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` after a criteria change. Invalid
    /// criteria leave an empty view plus a warning.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match filter(table, &self.criteria) {
            Ok(view) => {
                self.visible_indices = view.into_indices();
                self.warning = None;
            }
            Err(e) => {
                log::warn!("Filter criteria rejected: {e}");
                self.visible_indices.clear();
                self.warning = Some(format!("Warning: {e}"));
            }
        }
    }

    /// The currently visible subset, if a table is loaded.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.table
            .as_ref()
            .map(|t| FilteredView::new(t, self.visible_indices.clone()))
    }

    pub fn toggle_label(&mut self, source: LabelSource, label: Label) {
        let set = match source {
            LabelSource::Primary => &mut self.criteria.primary_labels,
            LabelSource::Secondary => &mut self.criteria.secondary_labels,
        };
        if !set.remove(&label) {
            set.insert(label);
        }
        self.refilter();
    }

    pub fn toggle_significance(&mut self, significance: Significance) {
        let set = &mut self.criteria.significance;
        if !set.remove(&significance) {
            set.insert(significance);
        }
        self.refilter();
    }

    pub fn toggle_detector(&mut self, code: char) {
        if !self.criteria.detectors.remove(code) {
            self.criteria.detectors.insert(code);
        }
        self.refilter();
    }

    pub fn set_mode(&mut self, mode: SubselectionMode) {
        self.criteria.mode = mode;
        self.refilter();
    }
}
