use std::collections::BTreeSet;

/// Capability check supplied by the embedding application.
///
/// The engine never consults user/rights storage itself; the caller hands
/// in an opaque predicate answering "may this viewer see group identities
/// for that study". Used only for blinding, never for filtering.
pub trait Viewer {
    fn can_see_group_labels(&self, study: Option<&str>) -> bool;
}

/// A viewer with full access (administrators, unblinded studies, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenViewer;

impl Viewer for OpenViewer {
    fn can_see_group_labels(&self, _study: Option<&str>) -> bool {
        true
    }
}

/// A viewer blinded to every group identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlindedViewer;

impl Viewer for BlindedViewer {
    fn can_see_group_labels(&self, _study: Option<&str>) -> bool {
        false
    }
}

/// A viewer blinded only for an explicit set of studies.
#[derive(Debug, Clone, Default)]
pub struct StudyBlindedViewer {
    blinded_studies: BTreeSet<String>,
}

impl StudyBlindedViewer {
    pub fn new(blinded_studies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            blinded_studies: blinded_studies.into_iter().map(Into::into).collect(),
        }
    }
}

impl Viewer for StudyBlindedViewer {
    fn can_see_group_labels(&self, study: Option<&str>) -> bool {
        match study {
            Some(study) => !self.blinded_studies.contains(study),
            // Results outside any study carry no blinding requirement.
            None => true,
        }
    }
}
