//! Join GraceDB and GWSkyNet-Multi alert tables and narrow the merged
//! events by classification, significance and detector subselection.
//!
//! The engine lives in [`data`]: [`data::loader::load_sources`] builds the
//! merged [`data::model::EventTable`], [`data::filter::filter`] applies a
//! [`data::filter::FilterCriteria`]. The remaining modules are the egui
//! viewer built on top of it.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod style;
pub mod ui;
