/// Data layer: core types, loading, joining and filtering.
///
/// Architecture:
/// ```text
///  GraceDB (.csv/.json/.parquet)   GWSkyNet (.csv/.json/.parquet)
///              │                              │
///              └──────────────┬───────────────┘
///                             ▼
///                      ┌─────────────┐
///                      │   loader    │  read → Table, inner join on key
///                      └─────────────┘
///                             │
///                             ▼
///                      ┌─────────────┐
///                      │ EventTable  │  typed records, read-only
///                      └─────────────┘
///                             │
///                             ▼
///                      ┌─────────────┐
///                      │   filter    │  labels ∧ significance ∧ detectors
///                      └─────────────┘
///                             │
///                             ▼
///                       FilteredView
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
