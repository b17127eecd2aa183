#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Analysis engine for Spirit result records: cross-tab construction,
//! per-column statistics, box-plot reduction, and DataWarrior export.
//!
//! The engine is synchronous, CPU-bound computation over in-memory
//! snapshots — no I/O and no shared mutable state. Callers build a fresh
//! [`crosstab::PivotDataTable`] / [`analysis::Analyzer`] per data or
//! template change (typically from a background worker thread); distinct
//! instances may be computed in parallel without coordination. There is no
//! cancellation inside the engine: computations are deterministic and
//! bounded by input size.
//!
//! Data flow:
//! - [`spirit_model::PivotTemplate::init`] classifies the applicable
//!   dimensions of a record set
//! - [`crosstab::PivotDataTable::compute`] materializes the cross-tab
//! - [`analysis::Analyzer`] summarizes each measurement column
//! - [`series::Series`] / [`datawarrior::DataWarriorExporter`] feed the
//!   rendering and export surfaces

pub mod analysis;
pub mod crosstab;
pub mod datawarrior;
pub mod series;

pub use analysis::{Analyzer, ColumnAnalyser, ColumnSort, Distribution, KruskalWallis};
pub use crosstab::{FlatTable, PivotCell, PivotColumn, PivotDataTable, PivotKey, PivotRow};
pub use datawarrior::{ChartKind, DataWarriorConfig, DataWarriorExporter, ExportError};
pub use series::{fences, BoxPlot, Fences, PhaseBox, Rgb, Series, SimpleResult};
