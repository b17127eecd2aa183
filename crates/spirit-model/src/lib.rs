#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! `spirit-model` defines the core in-memory data model for result
//! analysis: measurement records, their sample/study associations, and the
//! pivot template configuration.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the analysis engine (cross-tab, statistics, export)
//! - interactive hosts via `serde` (JSON-safe schema, clone-edit-cancel
//!   template workflows)

mod result;
pub mod template;
mod value;
mod viewer;

pub use result::{GroupRef, LabResult, PhaseRef, Quality, SampleRef};
pub use template::{
    Aggregation, Classifier, PivotItem, PivotTemplate, Placement, BLINDED_LABEL,
};
pub use value::{KeyPart, ResultValue};
pub use viewer::{BlindedViewer, OpenViewer, StudyBlindedViewer, Viewer};
