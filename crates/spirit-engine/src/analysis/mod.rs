//! Statistical summarization per measurement column.
//!
//! Independent of the row/column pivoting: records are partitioned by what
//! was measured — (test, attribute, timepoint) — and each partition is
//! summarized: sample count, distribution shape (drives linear vs.
//! logarithmic plot axes), and a Kruskal-Wallis omnibus test across the
//! treatment groups. The most significant columns can then be surfaced
//! first.

use std::collections::{BTreeMap, BTreeSet};

use spirit_model::{LabResult, Viewer, BLINDED_LABEL};

use crate::series::SimpleResult;

mod kruskal;
mod report;

pub use kruskal::{kruskal_wallis, KruskalWallis};

/// Shape classification of a column's numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Distribution {
    Normal,
    LogNormal,
    /// No numeric values at all; plotted as categorical counts.
    Categorical,
}

impl Distribution {
    pub fn label(self) -> &'static str {
        match self {
            Distribution::Normal => "Normal",
            Distribution::LogNormal => "Log-normal",
            Distribution::Categorical => "Categorical",
        }
    }
}

/// Orderings for [`Analyzer::sorted_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSort {
    Name,
    SampleCount,
    Distribution,
    Groups,
    /// Lowest Kruskal-Wallis p-value first; untestable columns last.
    Significance,
}

/// Statistics for one measurement column; a pure function of its input
/// records, computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAnalyser {
    name: String,
    results: Vec<SimpleResult>,
    numeric_count: usize,
    group_count: usize,
    distribution: Distribution,
    kruskal: Option<KruskalWallis>,
}

impl ColumnAnalyser {
    fn new(name: String, results: Vec<SimpleResult>) -> Self {
        let mut numeric: Vec<f64> = Vec::new();
        let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for result in &results {
            if let Some(value) = result.double_value() {
                numeric.push(value);
                if let Some(group) = result.group.as_deref() {
                    by_group.entry(group).or_default().push(value);
                }
            }
        }

        let groups: Vec<Vec<f64>> = by_group.into_values().collect();
        let group_count = groups.len();
        let kruskal = kruskal_wallis(&groups);
        let distribution = classify(&numeric);

        Self {
            name,
            numeric_count: numeric.len(),
            group_count,
            distribution,
            kruskal,
            results,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flattened (phase, group, value) triples of this column.
    pub fn simple_results(&self) -> &[SimpleResult] {
        &self.results
    }

    /// Count of records whose value parses as a number.
    pub fn n(&self) -> usize {
        self.numeric_count
    }

    /// Distinct groups contributing at least one numeric observation.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// `None` when the test is undefined for this column.
    pub fn kruskal_wallis(&self) -> Option<&KruskalWallis> {
        self.kruskal.as_ref()
    }
}

/// Statistical summary over a whole result set, one analyser per
/// measurement column. Transient: rebuilt whenever data or template
/// change, never cached across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    columns: Vec<ColumnAnalyser>,
}

impl Analyzer {
    pub fn new(results: &[LabResult], viewer: &dyn Viewer) -> Self {
        let aliases = blinded_aliases(results, viewer);

        let mut partitions: BTreeMap<(String, String, Option<String>), Vec<SimpleResult>> =
            BTreeMap::new();
        for result in results {
            let phase = result.phase().map(|p| p.name.clone());
            let group = result.group().map(|g| {
                aliases
                    .get(g.name.as_str())
                    .cloned()
                    .unwrap_or_else(|| g.name.clone())
            });
            let key = (result.test.clone(), result.attribute.clone(), phase.clone());
            partitions.entry(key).or_default().push(SimpleResult {
                phase,
                group,
                value: result.value.clone(),
            });
        }

        let columns = partitions
            .into_iter()
            .map(|((test, attribute, phase), simple)| {
                let mut name = format!("{test} / {attribute}");
                if let Some(phase) = phase {
                    name.push_str(" @ ");
                    name.push_str(&phase);
                }
                ColumnAnalyser::new(name, simple)
            })
            .collect();

        Self { columns }
    }

    /// Analysed columns in name order.
    pub fn columns(&self) -> &[ColumnAnalyser] {
        &self.columns
    }

    pub fn sorted_columns(&self, sort: ColumnSort) -> Vec<&ColumnAnalyser> {
        let mut out: Vec<&ColumnAnalyser> = self.columns.iter().collect();
        match sort {
            ColumnSort::Name => {}
            ColumnSort::SampleCount => {
                out.sort_by(|a, b| b.n().cmp(&a.n()).then_with(|| a.name().cmp(b.name())));
            }
            ColumnSort::Distribution => {
                out.sort_by(|a, b| {
                    a.distribution()
                        .cmp(&b.distribution())
                        .then_with(|| a.name().cmp(b.name()))
                });
            }
            ColumnSort::Groups => {
                out.sort_by(|a, b| {
                    b.group_count()
                        .cmp(&a.group_count())
                        .then_with(|| a.name().cmp(b.name()))
                });
            }
            ColumnSort::Significance => {
                out.sort_by(|a, b| {
                    let pa = a.kruskal_wallis().map(|kw| kw.p_value);
                    let pb = b.kruskal_wallis().map(|kw| kw.p_value);
                    match (pa, pb) {
                        (Some(pa), Some(pb)) => pa
                            .total_cmp(&pb)
                            .then_with(|| a.name().cmp(b.name())),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => a.name().cmp(b.name()),
                    }
                });
            }
        }
        out
    }

    /// Self-contained HTML summary, most significant columns first.
    pub fn html_report(&self) -> String {
        report::render(self)
    }
}

/// Stable display aliases for group names the viewer may not see.
///
/// Each real group keeps a distinct alias so blinding hides identities
/// without collapsing the group structure (statistics and row counts stay
/// intact).
fn blinded_aliases(results: &[LabResult], viewer: &dyn Viewer) -> BTreeMap<String, String> {
    let mut hidden: BTreeSet<String> = BTreeSet::new();
    for result in results {
        if viewer.can_see_group_labels(result.study()) {
            continue;
        }
        if let Some(group) = result.group() {
            hidden.insert(group.name.clone());
        }
    }
    hidden
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name, format!("{} {}", BLINDED_LABEL, idx + 1)))
        .collect()
}

/// Shape heuristic for the plot axis choice.
///
/// Log-normal only when a log transform makes the sample distinctly more
/// symmetric: all values positive, raw skewness beyond 0.5 in magnitude,
/// and the log-transformed skewness strictly smaller. Everything
/// degenerate (short, non-positive, zero-variance) stays on a linear axis.
fn classify(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::Categorical;
    }
    if values.len() < 3 || values.iter().any(|v| *v <= 0.0) {
        return Distribution::Normal;
    }
    let raw = match skewness(values) {
        Some(s) => s,
        None => return Distribution::Normal,
    };
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let log = match skewness(&logs) {
        Some(s) => s,
        None => return Distribution::Normal,
    };
    if raw.abs() > 0.5 && log.abs() < raw.abs() {
        Distribution::LogNormal
    } else {
        Distribution::Normal
    }
}

/// Sample skewness `m3 / m2^(3/2)`; `None` on zero variance.
fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    for &v in values {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
    }
    m2 /= n;
    m3 /= n;
    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return None;
    }
    let g1 = m3 / m2.powf(1.5);
    g1.is_finite().then_some(g1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_handles_degenerate_input() {
        assert_eq!(classify(&[]), Distribution::Categorical);
        assert_eq!(classify(&[1.0]), Distribution::Normal);
        assert_eq!(classify(&[5.0, 5.0, 5.0]), Distribution::Normal);
        // Non-positive values cannot be log-transformed.
        assert_eq!(classify(&[-1.0, 2.0, 3.0, 4.0]), Distribution::Normal);
    }

    #[test]
    fn classify_flags_multiplicative_spread_as_log_normal() {
        // Powers of ten: heavily right-skewed raw, symmetric in log space.
        let values = [1.0, 10.0, 100.0, 1000.0, 10000.0];
        assert_eq!(classify(&values), Distribution::LogNormal);
    }

    #[test]
    fn classify_keeps_symmetric_data_normal() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0];
        assert_eq!(classify(&values), Distribution::Normal);
    }
}
