//! Pivot template configuration.
//!
//! A template decides, for a fixed set of result records, which dimensions
//! are meaningful and which role each one plays in the cross-tab:
//! - `Row`: the dimension spans the vertical axis
//! - `Column`: the dimension spans the horizontal axis
//! - `Cell`: the dimension stays nested inside each cell (drill-down)
//!
//! Templates are plain serde-friendly values: interactive callers clone a
//! working copy, let the user edit it, and either commit or drop it
//! (cancel semantics), comparing against canned presets with `==`.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::result::LabResult;
use crate::value::KeyPart;
use crate::viewer::Viewer;


/// Placeholder shown in place of a blinded dimension title.
pub const BLINDED_LABEL: &str = "Blinded";

/// Broad family a dimension belongs to; drives default placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Classifier {
    /// Study-level identification.
    Top,
    /// Treatment-group structure (the blinding-sensitive family).
    StudyGroup,
    /// Study timepoints.
    StudyPhase,
    /// Properties of the measured sample itself.
    Biosample,
    /// What was measured.
    Measurement,
    /// QC / bookkeeping metadata.
    Metadata,
}

/// One classifiable dimension of a result record.
///
/// A closed enum instead of an open class hierarchy: every dimension the
/// engine understands is listed here, so placement handling is exhaustive
/// at compile time. Identity is the variant itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PivotItem {
    Study,
    Group,
    Subgroup,
    Phase,
    Biotype,
    SampleId,
    Test,
    Attribute,
    Quality,
}

impl PivotItem {
    pub const ALL: [PivotItem; 9] = [
        PivotItem::Study,
        PivotItem::Group,
        PivotItem::Subgroup,
        PivotItem::Phase,
        PivotItem::Biotype,
        PivotItem::SampleId,
        PivotItem::Test,
        PivotItem::Attribute,
        PivotItem::Quality,
    ];

    pub fn classifier(self) -> Classifier {
        match self {
            PivotItem::Study => Classifier::Top,
            PivotItem::Group | PivotItem::Subgroup => Classifier::StudyGroup,
            PivotItem::Phase => Classifier::StudyPhase,
            PivotItem::Biotype | PivotItem::SampleId => Classifier::Biosample,
            PivotItem::Test | PivotItem::Attribute => Classifier::Measurement,
            PivotItem::Quality => Classifier::Metadata,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PivotItem::Study => "Study",
            PivotItem::Group => "Group",
            PivotItem::Subgroup => "Subgroup",
            PivotItem::Phase => "Phase",
            PivotItem::Biotype => "Biotype",
            PivotItem::SampleId => "SampleId",
            PivotItem::Test => "Test",
            PivotItem::Attribute => "Attribute",
            PivotItem::Quality => "Quality",
        }
    }

    /// Grouping/sorting atom for this dimension on one record.
    ///
    /// Missing components become [`KeyPart::Blank`] so the record still
    /// lands in the cross-tab. Phases key on their chronological rank when
    /// one is set ("d10" after "d2"); the display title stays the label.
    pub fn key_part(self, result: &LabResult) -> KeyPart {
        match self {
            PivotItem::Study => text_part(result.study()),
            PivotItem::Group => text_part(result.group().map(|g| g.name.as_str())),
            PivotItem::Subgroup => match result.group().and_then(|g| g.subgroup) {
                Some(sub) => KeyPart::Number(OrderedFloat(f64::from(sub))),
                None => KeyPart::Blank,
            },
            PivotItem::Phase => match result.phase() {
                Some(phase) => match phase.rank {
                    Some(rank) => KeyPart::Number(OrderedFloat(f64::from(rank))),
                    None => KeyPart::Text(phase.name.clone()),
                },
                None => KeyPart::Blank,
            },
            PivotItem::Biotype => text_part(result.biotype()),
            PivotItem::SampleId => {
                text_part(result.sample.as_ref().map(|s| s.sample_id.as_str()))
            }
            PivotItem::Test => KeyPart::Text(result.test.clone()),
            PivotItem::Attribute => KeyPart::Text(result.attribute.clone()),
            PivotItem::Quality => KeyPart::Text(result.quality.label().to_string()),
        }
    }

    /// Human title of this dimension on one record; `None` when absent.
    pub fn title(self, result: &LabResult) -> Option<String> {
        match self {
            PivotItem::Phase => result.phase().map(|p| p.name.clone()),
            PivotItem::Subgroup => result
                .group()
                .and_then(|g| g.subgroup)
                .map(|sub| sub.to_string()),
            _ => match self.key_part(result) {
                KeyPart::Blank => None,
                part => Some(part.display_string()),
            },
        }
    }
}

fn text_part(value: Option<&str>) -> KeyPart {
    match value {
        Some(s) => KeyPart::Text(s.to_string()),
        None => KeyPart::Blank,
    }
}

/// Role a dimension plays in the cross-tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    Row,
    Column,
    Cell,
}

/// Optional transform applied when a cell aggregates several values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    Sum,
    Average,
    Count,
    Min,
    Max,
}

impl Aggregation {
    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Average => "Average",
            Aggregation::Count => "Count",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
        }
    }
}

/// Declarative pivot configuration: which dimension goes where.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTemplate {
    pub name: String,
    placements: BTreeMap<PivotItem, Placement>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    blinded: BTreeSet<PivotItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<Aggregation>,
}

impl PivotTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Canned layout: one column per measured parameter and timepoint,
    /// samples spread over the rows.
    pub fn per_attribute() -> Self {
        let mut template = Self::new("Column per attribute");
        for item in PivotItem::ALL {
            template.placements.insert(item, default_placement(item));
        }
        template
    }

    /// Canned layout: group rows only, sample detail nested in the cells.
    pub fn compact() -> Self {
        let mut template = Self::new("Compact");
        for item in PivotItem::ALL {
            let placement = match item.classifier() {
                Classifier::StudyGroup => Placement::Row,
                Classifier::StudyPhase | Classifier::Measurement => Placement::Column,
                Classifier::Top | Classifier::Biosample | Classifier::Metadata => Placement::Cell,
            };
            template.placements.insert(item, placement);
        }
        template
    }

    /// Canned layout: no pivoting at all, every dimension nested — a flat
    /// drill-down list.
    pub fn flat() -> Self {
        let mut template = Self::new("Flat");
        for item in PivotItem::ALL {
            template.placements.insert(item, Placement::Cell);
        }
        template
    }

    /// Scans the records, keeps only applicable dimensions and gives every
    /// newly applicable one a default role.
    ///
    /// A dimension is applicable when the records disagree on it: a single
    /// shared value (or a uniformly absent one) carries no discriminating
    /// information, so e.g. "Group" only appears once at least two groups
    /// exist in the data. Roles already configured (presets, user edits)
    /// are preserved for dimensions that stay applicable.
    pub fn init(&mut self, results: &[LabResult]) {
        let applicable = applicable_items(results);
        self.placements.retain(|item, _| applicable.contains(item));
        self.blinded.retain(|item| applicable.contains(item));
        for &item in &applicable {
            self.placements
                .entry(item)
                .or_insert_with(|| default_placement(item));
        }
    }

    /// Drops dimensions whose value is constant across every record.
    ///
    /// Constant dimensions add visual noise without discriminating
    /// anything; removing them cannot change which cells exist.
    pub fn simplify(&mut self, results: &[LabResult]) {
        let applicable = applicable_items(results);
        self.placements.retain(|item, _| applicable.contains(item));
        self.blinded.retain(|item| applicable.contains(item));
    }

    /// Marks group-structure dimensions blinded when the viewer may not see
    /// group identities for any study present in the records.
    ///
    /// Blinded dimensions keep their real grouping key — the cross-tab
    /// keeps the same rows and columns — but resolve their display title to
    /// [`BLINDED_LABEL`].
    pub fn remove_blind_items(&mut self, results: &[LabResult], viewer: &dyn Viewer) {
        let mut studies: BTreeSet<Option<&str>> = BTreeSet::new();
        for result in results {
            studies.insert(result.study());
        }
        let blinded_study = studies
            .iter()
            .any(|study| !viewer.can_see_group_labels(*study));
        if !blinded_study {
            return;
        }
        for item in self.placements.keys() {
            if item.classifier() == Classifier::StudyGroup {
                self.blinded.insert(*item);
            }
        }
    }

    /// Reassigns a dimension's role. Returns `false` when the dimension is
    /// not part of the template (not applicable for the current records) —
    /// the caller can surface the miss instead of losing the edit silently.
    pub fn set_placement(&mut self, item: PivotItem, placement: Placement) -> bool {
        match self.placements.get_mut(&item) {
            Some(slot) => {
                *slot = placement;
                true
            }
            None => false,
        }
    }

    pub fn placement_of(&self, item: PivotItem) -> Option<Placement> {
        self.placements.get(&item).copied()
    }

    /// Dimensions assigned to `placement`, in stable declaration order.
    pub fn items_at(&self, placement: Placement) -> Vec<PivotItem> {
        self.placements
            .iter()
            .filter(|(_, p)| **p == placement)
            .map(|(item, _)| *item)
            .collect()
    }

    pub fn items(&self) -> impl Iterator<Item = (PivotItem, Placement)> + '_ {
        self.placements.iter().map(|(item, p)| (*item, *p))
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn is_blinded(&self, item: PivotItem) -> bool {
        self.blinded.contains(&item)
    }

    /// Display title of `item` on `result`, applying blinding.
    pub fn resolve_title(&self, item: PivotItem, result: &LabResult) -> Option<String> {
        if self.is_blinded(item) {
            return Some(BLINDED_LABEL.to_string());
        }
        item.title(result)
    }

    pub fn clear(&mut self) {
        self.placements.clear();
        self.blinded.clear();
        self.computed = None;
    }
}

fn default_placement(item: PivotItem) -> Placement {
    match item.classifier() {
        Classifier::Top | Classifier::StudyGroup | Classifier::Biosample => Placement::Row,
        Classifier::StudyPhase | Classifier::Measurement => Placement::Column,
        Classifier::Metadata => Placement::Cell,
    }
}

/// Dimensions on which the records disagree (at least two distinct key
/// parts, a blank counting as a value of its own).
fn applicable_items(results: &[LabResult]) -> BTreeSet<PivotItem> {
    let mut applicable = BTreeSet::new();
    for item in PivotItem::ALL {
        let mut seen: BTreeSet<KeyPart> = BTreeSet::new();
        for result in results {
            seen.insert(item.key_part(result));
            if seen.len() > 1 {
                applicable.insert(item);
                break;
            }
        }
    }
    applicable
}
