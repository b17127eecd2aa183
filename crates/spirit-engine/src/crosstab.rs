//! Cross-tab construction.
//!
//! This module is intentionally self-contained: it takes an immutable
//! snapshot of result records plus a [`PivotTemplate`] and produces the
//! row × column × cell grid a presentation layer renders or exports.
//!
//! - Rows and columns are the sorted distinct key tuples of the template's
//!   `Row`/`Column` dimensions; the ordering is total, so recomputing over
//!   the same input always yields the same table.
//! - Columns are shared across all rows; a (row, column) pair with no data
//!   is an empty cell, never an absent entry.
//! - A record with a missing dimension component contributes a blank key
//!   part in that position and is kept, not dropped.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use spirit_model::{
    Aggregation, KeyPart, LabResult, PivotItem, PivotTemplate, Placement, ResultValue,
};

/// Tuple of key parts identifying one row, column, or nested cell entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PivotKey(pub Vec<KeyPart>);

impl PivotKey {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialOrd for PivotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PivotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// One axis entry: the grouping key plus the display labels captured from
/// the first record that produced the key (blinding already applied).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotAxisEntry {
    key: PivotKey,
    labels: Vec<String>,
}

impl PivotAxisEntry {
    pub fn key(&self) -> &PivotKey {
        &self.key
    }

    /// Per-dimension display labels, one per axis item.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Joined display label; empty components are skipped.
    pub fn label(&self) -> String {
        self.labels
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

pub type PivotRow = PivotAxisEntry;
pub type PivotColumn = PivotAxisEntry;

/// Values sharing one nested (cell-level) key inside a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEntry {
    pub key: PivotKey,
    pub labels: Vec<String>,
    pub values: Vec<ResultValue>,
}

/// Contents of one (row, column) intersection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotCell {
    entries: Vec<CellEntry>,
    value: Option<ResultValue>,
}

impl PivotCell {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nested entries, one per distinct cell-level key, in key order.
    pub fn entries(&self) -> &[CellEntry] {
        &self.entries
    }

    pub fn distinct_key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &ResultValue> {
        self.entries.iter().flat_map(|e| e.values.iter())
    }

    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    /// The single display value: present when the cell has at most one
    /// nested key and either holds exactly one value or the template
    /// configured a computed aggregation.
    pub fn value(&self) -> Option<&ResultValue> {
        self.value.as_ref()
    }

    /// Fallback rendering for drill-down cells: every value, joined.
    pub fn display_string(&self) -> String {
        if let Some(value) = &self.value {
            return value.display_string();
        }
        self.values()
            .map(|v| v.display_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Flat header + string-rows rendering of a pivot table, used by CSV-style
/// export and simple table views.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The materialized cross-tab.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotDataTable {
    template: PivotTemplate,
    row_items: Vec<PivotItem>,
    column_items: Vec<PivotItem>,
    cell_items: Vec<PivotItem>,
    rows: Vec<PivotRow>,
    columns: Vec<PivotColumn>,
    cells: Vec<Vec<PivotCell>>,
}

impl PivotDataTable {
    pub fn compute(results: &[LabResult], template: &PivotTemplate) -> Self {
        let row_items = template.items_at(Placement::Row);
        let column_items = template.items_at(Placement::Column);
        let cell_items = template.items_at(Placement::Cell);

        let mut cube: BTreeMap<PivotKey, BTreeMap<PivotKey, BTreeMap<PivotKey, Vec<ResultValue>>>> =
            BTreeMap::new();
        let mut column_keys: BTreeSet<PivotKey> = BTreeSet::new();
        let mut row_labels: HashMap<PivotKey, Vec<String>> = HashMap::new();
        let mut column_labels: HashMap<PivotKey, Vec<String>> = HashMap::new();
        let mut cell_labels: HashMap<PivotKey, Vec<String>> = HashMap::new();

        for result in results {
            let row_key = build_key(&row_items, result);
            let column_key = build_key(&column_items, result);
            let cell_key = build_key(&cell_items, result);

            row_labels
                .entry(row_key.clone())
                .or_insert_with(|| build_labels(&row_items, result, template));
            column_labels
                .entry(column_key.clone())
                .or_insert_with(|| build_labels(&column_items, result, template));
            cell_labels
                .entry(cell_key.clone())
                .or_insert_with(|| build_labels(&cell_items, result, template));

            column_keys.insert(column_key.clone());
            cube.entry(row_key)
                .or_default()
                .entry(column_key)
                .or_default()
                .entry(cell_key)
                .or_default()
                .push(result.value.clone());
        }

        let rows: Vec<PivotRow> = cube
            .keys()
            .map(|key| PivotAxisEntry {
                key: key.clone(),
                labels: row_labels.remove(key).unwrap_or_default(),
            })
            .collect();
        let columns: Vec<PivotColumn> = column_keys
            .iter()
            .map(|key| PivotAxisEntry {
                key: key.clone(),
                labels: column_labels.remove(key).unwrap_or_default(),
            })
            .collect();

        let mut cells = Vec::with_capacity(rows.len());
        for row in &rows {
            let row_map = cube.get(&row.key);
            let mut row_cells = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = match row_map.and_then(|m| m.get(&column.key)) {
                    Some(by_cell_key) => {
                        let entries: Vec<CellEntry> = by_cell_key
                            .iter()
                            .map(|(key, values)| CellEntry {
                                key: key.clone(),
                                labels: cell_labels.get(key).cloned().unwrap_or_default(),
                                values: values.clone(),
                            })
                            .collect();
                        let value = derive_cell_value(&entries, template.computed);
                        PivotCell { entries, value }
                    }
                    None => PivotCell::default(),
                };
                row_cells.push(cell);
            }
            cells.push(row_cells);
        }

        Self {
            template: template.clone(),
            row_items,
            column_items,
            cell_items,
            rows,
            columns,
            cells,
        }
    }

    pub fn template(&self) -> &PivotTemplate {
        &self.template
    }

    pub fn row_items(&self) -> &[PivotItem] {
        &self.row_items
    }

    pub fn column_items(&self) -> &[PivotItem] {
        &self.column_items
    }

    pub fn cell_items(&self) -> &[PivotItem] {
        &self.cell_items
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[PivotColumn] {
        &self.columns
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&PivotCell> {
        self.cells.get(row)?.get(column)
    }

    /// Display name of a column; the implicit single column of a template
    /// without `Column` dimensions is named "Value".
    pub fn column_name(&self, column: usize) -> String {
        match self.columns.get(column) {
            Some(col) => {
                let label = col.label();
                if label.is_empty() {
                    "Value".to_string()
                } else {
                    label
                }
            }
            None => String::new(),
        }
    }

    /// All numeric values in one row of one column (used to feed series).
    pub fn numeric_cell_values(&self, row: usize, column: usize) -> Vec<f64> {
        self.cell(row, column)
            .map(|cell| {
                cell.values()
                    .filter_map(|v| v.as_number())
                    .filter(|v| v.is_finite())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Header + string rows; drill-down cells render their values joined.
    pub fn flatten(&self) -> FlatTable {
        let mut headers: Vec<String> =
            self.row_items.iter().map(|i| i.label().to_string()).collect();
        for column in 0..self.columns.len() {
            headers.push(self.column_name(column));
        }

        let mut out_rows = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            let mut line: Vec<String> = row.labels().to_vec();
            for c in 0..self.columns.len() {
                let text = self
                    .cell(r, c)
                    .map(|cell| cell.display_string())
                    .unwrap_or_default();
                line.push(text);
            }
            out_rows.push(line);
        }

        FlatTable {
            headers,
            rows: out_rows,
        }
    }
}

fn build_key(items: &[PivotItem], result: &LabResult) -> PivotKey {
    PivotKey(items.iter().map(|item| item.key_part(result)).collect())
}

fn build_labels(items: &[PivotItem], result: &LabResult, template: &PivotTemplate) -> Vec<String> {
    items
        .iter()
        .map(|item| template.resolve_title(*item, result).unwrap_or_default())
        .collect()
}

fn derive_cell_value(entries: &[CellEntry], computed: Option<Aggregation>) -> Option<ResultValue> {
    if entries.len() != 1 {
        return None;
    }
    let values = &entries[0].values;
    match computed {
        Some(agg) => aggregate(values, agg),
        None => {
            if values.len() == 1 {
                Some(values[0].clone())
            } else {
                None
            }
        }
    }
}

fn aggregate(values: &[ResultValue], agg: Aggregation) -> Option<ResultValue> {
    if agg == Aggregation::Count {
        let count = values.iter().filter(|v| !v.is_blank()).count();
        return Some(ResultValue::Number(count as f64));
    }

    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|v| v.as_number())
        .filter(|v| v.is_finite())
        .collect();
    if numbers.is_empty() {
        return None;
    }
    let value = match agg {
        Aggregation::Sum => numbers.iter().sum(),
        Aggregation::Average => numbers.iter().sum::<f64>() / numbers.len() as f64,
        Aggregation::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Count => unreachable!("handled above"),
    };
    Some(ResultValue::Number(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirit_model::{GroupRef, PhaseRef, SampleRef};

    fn weight(sample: &str, group: &str, phase: &str, rank: u32, value: &str) -> LabResult {
        LabResult::new("Weighing", "Weight", value).with_sample(
            SampleRef::new(sample)
                .with_study("S-1")
                .with_group(GroupRef::new(group))
                .with_phase(PhaseRef::ranked(phase, rank)),
        )
    }

    fn table(results: &[LabResult]) -> PivotDataTable {
        let mut template = PivotTemplate::new("test");
        template.init(results);
        PivotDataTable::compute(results, &template)
    }

    #[test]
    fn empty_column_for_missing_row_column_pair() {
        let results = vec![
            weight("S1", "A", "d1", 1, "10"),
            weight("S2", "B", "d1", 1, "20"),
            weight("S2", "B", "d7", 7, "30"),
        ];
        let mut template = PivotTemplate::new("test");
        template.init(&results);
        // Collapse sample detail into cells so rows are pure groups.
        template.set_placement(PivotItem::SampleId, Placement::Cell);
        let table = PivotDataTable::compute(&results, &template);

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.columns().len(), 2);
        // Group A never measured at d7: the cell exists and is empty.
        let a_d7 = table.cell(0, 1).unwrap();
        assert!(a_d7.is_empty());
        assert_eq!(a_d7.value(), None);
    }

    #[test]
    fn blank_components_group_together() {
        let orphan_a = LabResult::new("Weighing", "Weight", "1");
        let orphan_b = LabResult::new("Weighing", "Weight", "2");
        let grouped = weight("S1", "A", "d1", 1, "3");
        let results = vec![orphan_a, orphan_b, grouped];
        let table = table(&results);

        // Both orphans land in the same (blank-keyed) row bucket.
        let blank_rows = table
            .rows()
            .iter()
            .filter(|row| row.key().0.iter().all(|p| p.is_blank()))
            .count();
        assert_eq!(blank_rows, 1);
    }

    #[test]
    fn phase_columns_sort_by_rank() {
        let results = vec![
            weight("S1", "A", "d10", 10, "1"),
            weight("S1", "A", "d2", 2, "2"),
            weight("S2", "B", "d1", 1, "3"),
        ];
        let table = table(&results);
        let names: Vec<String> = (0..table.columns().len())
            .map(|c| table.column_name(c))
            .collect();
        assert_eq!(names, vec!["d1", "d2", "d10"]);
    }

    #[test]
    fn computed_average_fills_multi_value_cells() {
        // Two measurements of the same sample at the same timepoint.
        let results = vec![
            weight("S1", "A", "d1", 1, "10"),
            weight("S1", "A", "d1", 1, "20"),
            weight("S2", "B", "d1", 1, "60"),
        ];
        let mut template = PivotTemplate::new("test");
        template.init(&results);
        template.set_placement(PivotItem::SampleId, Placement::Cell);

        let plain = PivotDataTable::compute(&results, &template);
        let a = plain.cell(0, 0).unwrap();
        assert_eq!(a.distinct_key_count(), 1);
        assert_eq!(a.value_count(), 2);
        // Two values cannot collapse to one without an aggregation.
        assert_eq!(a.value(), None);

        template.computed = Some(Aggregation::Average);
        let averaged = PivotDataTable::compute(&results, &template);
        assert_eq!(
            averaged.cell(0, 0).unwrap().value(),
            Some(&ResultValue::Number(15.0))
        );
        assert_eq!(
            averaged.cell(1, 0).unwrap().value(),
            Some(&ResultValue::Number(60.0))
        );
    }

    #[test]
    fn nested_keys_take_precedence_over_aggregation() {
        // Distinct samples nested in the same group cell stay a drill-down
        // list even when an aggregation is configured.
        let results = vec![
            weight("S1", "A", "d1", 1, "10"),
            weight("S2", "A", "d1", 1, "20"),
            weight("S3", "B", "d1", 1, "60"),
        ];
        let mut template = PivotTemplate::new("test");
        template.init(&results);
        template.set_placement(PivotItem::SampleId, Placement::Cell);
        template.computed = Some(Aggregation::Average);
        let table = PivotDataTable::compute(&results, &template);

        let a = table.cell(0, 0).unwrap();
        assert_eq!(a.distinct_key_count(), 2);
        assert_eq!(a.value(), None);
    }

    #[test]
    fn flatten_emits_headers_and_one_line_per_row() {
        let results = vec![
            weight("S1", "A", "d1", 1, "10"),
            weight("S2", "B", "d7", 7, "20"),
        ];
        let table = table(&results);
        let flat = table.flatten();
        assert_eq!(flat.rows.len(), 2);
        assert_eq!(flat.headers.len(), table.row_items().len() + 2);
        assert_eq!(flat.headers.last().map(String::as_str), Some("d7"));
    }
}
