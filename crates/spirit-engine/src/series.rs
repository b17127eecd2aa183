//! Per-series reduction for plotting: robust quartile fences, whiskers and
//! outliers for box plots, and categorical value counting for dot plots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use spirit_model::{LabResult, ResultValue};

/// Flattened (phase, group, value) view of one measurement, the unit the
/// statistics layer works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub value: ResultValue,
}

impl SimpleResult {
    pub fn new(
        phase: Option<impl Into<String>>,
        group: Option<impl Into<String>>,
        value: impl Into<ResultValue>,
    ) -> Self {
        Self {
            phase: phase.map(Into::into),
            group: group.map(Into::into),
            value: value.into(),
        }
    }

    /// Flattens a record to its (phase, group, value) triple. Blinding is
    /// applied by the analysis layer, which aliases group labels without
    /// collapsing the group structure.
    pub fn from_result(result: &LabResult) -> Self {
        Self {
            phase: result.phase().map(|p| p.name.clone()),
            group: result.group().map(|g| g.name.clone()),
            value: result.value.clone(),
        }
    }

    /// The numeric view of the value; `None` for text/blank values.
    pub fn double_value(&self) -> Option<f64> {
        self.value.as_number().filter(|v| v.is_finite())
    }
}

/// Display color attached to a series by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The (Q1, median, Q3) triple used to draw one box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fences {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Fences {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Quartile fences of an ascending-sorted slice.
///
/// Returns `None` below two observations. The branch rules are fixed —
/// downstream plots were calibrated against them:
/// - `n == 2`: the two points themselves, median halfway.
/// - `n == 3`: quartiles halfway between the median and its neighbors.
/// - `n >= 4`: split at the median (the median element itself belongs to
///   neither half when `n` is odd) and reduce each half: an even half
///   averages its two middle elements; an odd half of up to three elements
///   is its middle element; a longer odd half leans the middle a quarter
///   of the way toward its neighbor on the side facing the array's center.
pub fn fences(sorted: &[f64]) -> Option<Fences> {
    debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
    let n = sorted.len();
    match n {
        0 | 1 => None,
        2 => Some(Fences {
            q1: sorted[0],
            median: (sorted[0] + sorted[1]) / 2.0,
            q3: sorted[1],
        }),
        3 => Some(Fences {
            q1: (sorted[0] + sorted[1]) / 2.0,
            median: sorted[1],
            q3: (sorted[1] + sorted[2]) / 2.0,
        }),
        _ => {
            let median = if n % 2 == 0 {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            } else {
                sorted[n / 2]
            };
            let lower = &sorted[..n / 2];
            let upper = &sorted[(n + 1) / 2..];
            Some(Fences {
                q1: hinge(lower, Lean::High),
                median,
                q3: hinge(upper, Lean::Low),
            })
        }
    }
}

#[derive(Clone, Copy)]
enum Lean {
    /// Toward the element after the middle (lower half).
    High,
    /// Toward the element before the middle (upper half).
    Low,
}

fn hinge(half: &[f64], lean: Lean) -> f64 {
    let m = half.len();
    if m % 2 == 0 {
        return (half[m / 2 - 1] + half[m / 2]) / 2.0;
    }
    let middle = half[m / 2];
    if m <= 3 {
        return middle;
    }
    let neighbor = match lean {
        Lean::High => half[m / 2 + 1],
        Lean::Low => half[m / 2 - 1],
    };
    0.75 * middle + 0.25 * neighbor
}

/// One box of a box plot: fences plus whiskers and outliers.
///
/// Whiskers reach the farthest observations within `1.5 × IQR` of the
/// quartiles; points beyond are listed as outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub n: usize,
    pub fences: Fences,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// All boxes of one series, in the series' phase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPlot {
    pub series_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    pub boxes: Vec<PhaseBox>,
}

/// One statistical group's values, ready for rendering.
///
/// Rebuilt for every render; holds no identity beyond its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    color: Option<Rgb>,
    results: Vec<SimpleResult>,
}

impl Series {
    pub fn new(name: impl Into<String>, color: Option<Rgb>, results: Vec<SimpleResult>) -> Self {
        Self {
            name: name.into(),
            color,
            results,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<Rgb> {
        self.color
    }

    pub fn results(&self) -> &[SimpleResult] {
        &self.results
    }

    /// True when at least one value parses as a double.
    pub fn is_numeric(&self) -> bool {
        self.results.iter().any(|r| r.double_value().is_some())
    }

    /// Sorted finite numeric values; text, blank and NaN values excluded.
    pub fn numeric_values(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .results
            .iter()
            .filter_map(|r| r.double_value())
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Sorted numeric values restricted to one phase label.
    pub fn numeric_values_at(&self, phase: Option<&str>) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .results
            .iter()
            .filter(|r| r.phase.as_deref() == phase)
            .filter_map(|r| r.double_value())
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Quartile fences over the whole series.
    pub fn fences(&self) -> Option<Fences> {
        fences(&self.numeric_values())
    }

    /// Groups raw string values at one phase, exact and case-sensitive.
    /// Used to render categorical dot plots for non-numeric series.
    pub fn count_values(&self, phase: Option<&str>) -> BTreeMap<String, Vec<&SimpleResult>> {
        let mut out: BTreeMap<String, Vec<&SimpleResult>> = BTreeMap::new();
        for result in &self.results {
            if result.phase.as_deref() != phase {
                continue;
            }
            let label = result.value.display_string();
            if label.is_empty() {
                continue;
            }
            out.entry(label).or_default().push(result);
        }
        out
    }

    /// Phases in first-appearance order (callers feed chronologically
    /// sorted results), deduplicated.
    pub fn phases(&self) -> Vec<Option<String>> {
        let mut out: Vec<Option<String>> = Vec::new();
        for result in &self.results {
            if !out.contains(&result.phase) {
                out.push(result.phase.clone());
            }
        }
        out
    }

    /// Per-phase boxes; phases with fewer than two numeric observations
    /// yield no box.
    pub fn box_plot(&self) -> BoxPlot {
        let mut boxes = Vec::new();
        for phase in self.phases() {
            let values = self.numeric_values_at(phase.as_deref());
            let Some(f) = fences(&values) else {
                continue;
            };
            let reach = 1.5 * f.iqr();
            let low_limit = f.q1 - reach;
            let high_limit = f.q3 + reach;
            let whisker_low = values
                .iter()
                .copied()
                .find(|v| *v >= low_limit)
                .unwrap_or(f.q1);
            let whisker_high = values
                .iter()
                .copied()
                .rev()
                .find(|v| *v <= high_limit)
                .unwrap_or(f.q3);
            let outliers = values
                .iter()
                .copied()
                .filter(|v| *v < low_limit || *v > high_limit)
                .collect();
            boxes.push(PhaseBox {
                phase,
                n: values.len(),
                fences: f,
                whisker_low,
                whisker_high,
                outliers,
            });
        }
        BoxPlot {
            series_name: self.name.clone(),
            color: self.color,
            boxes,
        }
    }
}
