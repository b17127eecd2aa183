use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::value::ResultValue;

/// Review status attached to a measurement during QC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quality {
    #[default]
    Valid,
    Questionable,
    Bogus,
}

impl Quality {
    pub fn label(self) -> &'static str {
        match self {
            Quality::Valid => "Valid",
            Quality::Questionable => "Questionable",
            Quality::Bogus => "Bogus",
        }
    }
}

/// Treatment group a sample belongs to within its study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<u32>,
}

impl GroupRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subgroup: None,
        }
    }
}

/// Study timepoint ("d1", "d14", ...).
///
/// `rank` is the chronological position of the phase within its study and
/// drives sorting; phase labels alone would order "d10" before "d2".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl PhaseRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: None,
        }
    }

    pub fn ranked(name: impl Into<String>, rank: u32) -> Self {
        Self {
            name: name.into(),
            rank: Some(rank),
        }
    }
}

/// The biosample a measurement was taken from, with its inherited study
/// associations. Any association may be absent (samples without a study,
/// ungrouped samples, phaseless measurements).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRef {
    pub sample_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biotype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseRef>,
}

impl SampleRef {
    pub fn new(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            ..Self::default()
        }
    }

    pub fn with_biotype(mut self, biotype: impl Into<String>) -> Self {
        self.biotype = Some(biotype.into());
        self
    }

    pub fn with_study(mut self, study: impl Into<String>) -> Self {
        self.study = Some(study.into());
        self
    }

    pub fn with_group(mut self, group: GroupRef) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_phase(mut self, phase: PhaseRef) -> Self {
        self.phase = Some(phase);
        self
    }
}

/// One measurement row: what was measured (`test` + `attribute`), the
/// measured value, and the sample it was measured on.
///
/// Immutable from the analysis engine's perspective; the engine only ever
/// reads snapshots of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub test: String,
    pub attribute: String,
    pub value: ResultValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<SampleRef>,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl LabResult {
    pub fn new(
        test: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<ResultValue>,
    ) -> Self {
        Self {
            test: test.into(),
            attribute: attribute.into(),
            value: value.into(),
            sample: None,
            quality: Quality::default(),
            created_by: None,
            created_at: None,
        }
    }

    pub fn with_sample(mut self, sample: SampleRef) -> Self {
        self.sample = Some(sample);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn study(&self) -> Option<&str> {
        self.sample.as_ref()?.study.as_deref()
    }

    pub fn group(&self) -> Option<&GroupRef> {
        self.sample.as_ref()?.group.as_ref()
    }

    pub fn phase(&self) -> Option<&PhaseRef> {
        self.sample.as_ref()?.phase.as_ref()
    }

    pub fn biotype(&self) -> Option<&str> {
        self.sample.as_ref()?.biotype.as_deref()
    }
}
