//! DataWarrior `.dwar` export.
//!
//! The format is a plain-text contract with an external tool: a
//! `<datawarrior-fileinfo>` preamble, a tab-delimited table, then a
//! `<datawarrior properties>` block of `<key="value">` lines describing the
//! view (chart type, axes, colors, log scale). Field order and line syntax
//! must not change.
//!
//! The format has no representation for nested cells, so export validates
//! the whole table and fails before emitting a single byte when any
//! exported cell holds more than one nested key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crosstab::PivotDataTable;

const DWAR_VERSION: &str = "3.1";

/// Chart type of the exported view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    #[default]
    Scatter,
    BoxPlot,
    Whiskers,
}

impl ChartKind {
    fn dwar_name(self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::BoxPlot => "boxes",
            ChartKind::Whiskers => "whiskers",
        }
    }
}

/// View/axis configuration written into the properties block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataWarriorConfig {
    pub view_name: String,
    pub chart: ChartKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_by: Option<String>,
    #[serde(default)]
    pub log_scale: bool,
    /// Restricts the exported pivot columns; `None` exports all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_columns: Option<Vec<String>>,
}

impl Default for DataWarriorConfig {
    fn default() -> Self {
        Self {
            view_name: "2D View".to_string(),
            chart: ChartKind::default(),
            x_axis: None,
            y_axis: None,
            color_by: None,
            log_scale: false,
            selected_columns: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(
        "cell at row '{row}', column '{column}' holds {keys} nested keys; \
         the DataWarrior format cannot represent nested cells"
    )]
    NestedCell {
        row: String,
        column: String,
        keys: usize,
    },
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("nothing to export: the pivot table has no columns")]
    NoColumns,
}

pub struct DataWarriorExporter;

impl DataWarriorExporter {
    /// Serializes the table and view configuration to `.dwar` text.
    ///
    /// All validation happens up front; on error no partial output exists.
    pub fn export(
        table: &PivotDataTable,
        config: &DataWarriorConfig,
    ) -> Result<String, ExportError> {
        if table.columns().is_empty() {
            return Err(ExportError::NoColumns);
        }

        let exported = exported_columns(table, config)?;

        // Fail-fast pass: the format cannot carry drill-down cells.
        for (r, row) in table.rows().iter().enumerate() {
            for &c in &exported {
                if let Some(cell) = table.cell(r, c) {
                    let keys = cell.distinct_key_count();
                    if keys > 1 {
                        return Err(ExportError::NestedCell {
                            row: axis_name(&row.label()),
                            column: table.column_name(c),
                            keys,
                        });
                    }
                }
            }
        }

        let mut headers: Vec<String> = table
            .row_items()
            .iter()
            .map(|item| item.label().to_string())
            .collect();
        let computed = table.template().computed.is_some();
        for &c in &exported {
            let name = table.column_name(c);
            if computed {
                headers.push(name.clone());
                headers.push(format!("{name} N"));
            } else {
                headers.push(name);
            }
        }

        validate_column_ref(config.x_axis.as_deref(), &headers)?;
        validate_column_ref(config.y_axis.as_deref(), &headers)?;
        validate_column_ref(config.color_by.as_deref(), &headers)?;

        let mut out = String::new();
        out.push_str("<datawarrior-fileinfo>\n");
        out.push_str(&format!("<version=\"{DWAR_VERSION}\">\n"));
        out.push_str(&format!("<rowcount=\"{}\">\n", table.rows().len()));
        out.push_str("</datawarrior-fileinfo>\n");

        out.push_str(&headers.join("\t"));
        out.push('\n');
        for (r, row) in table.rows().iter().enumerate() {
            let mut fields: Vec<String> = row.labels().iter().map(|l| sanitize(l)).collect();
            for &c in &exported {
                let cell = table.cell(r, c);
                let text = cell.map(|cell| cell.display_string()).unwrap_or_default();
                fields.push(sanitize(&text));
                if computed {
                    let count = cell.map(|cell| cell.value_count()).unwrap_or(0);
                    fields.push(count.to_string());
                }
            }
            out.push_str(&fields.join("\t"));
            out.push('\n');
        }

        let view = &config.view_name;
        out.push_str("<datawarrior properties>\n");
        out.push_str(&format!(
            "<chartType_{view}=\"{}\">\n",
            config.chart.dwar_name()
        ));
        if let Some(x) = &config.x_axis {
            out.push_str(&format!("<axisColumn_{view}_0=\"{x}\">\n"));
        }
        if let Some(y) = &config.y_axis {
            out.push_str(&format!("<axisColumn_{view}_1=\"{y}\">\n"));
        }
        if let Some(color) = &config.color_by {
            out.push_str(&format!("<colorColumn_{view}=\"{color}\">\n"));
        }
        if config.log_scale {
            if let Some(y) = &config.y_axis {
                out.push_str(&format!("<logarithmicView=\"{y}\">\n"));
            }
        }
        out.push_str("</datawarrior properties>\n");

        Ok(out)
    }
}

/// Indices of the pivot columns to export, in table order.
fn exported_columns(
    table: &PivotDataTable,
    config: &DataWarriorConfig,
) -> Result<Vec<usize>, ExportError> {
    let all: Vec<usize> = (0..table.columns().len()).collect();
    let Some(selected) = &config.selected_columns else {
        return Ok(all);
    };
    let mut out = Vec::with_capacity(selected.len());
    for name in selected {
        let idx = all
            .iter()
            .copied()
            .find(|&c| table.column_name(c) == *name)
            .ok_or_else(|| ExportError::UnknownColumn(name.clone()))?;
        out.push(idx);
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn validate_column_ref(name: Option<&str>, headers: &[String]) -> Result<(), ExportError> {
    let Some(name) = name else {
        return Ok(());
    };
    if headers.iter().any(|h| h == name) {
        Ok(())
    } else {
        Err(ExportError::UnknownColumn(name.to_string()))
    }
}

fn axis_name(label: &str) -> String {
    if label.is_empty() {
        "(blank)".to_string()
    } else {
        label.to_string()
    }
}

/// Tab-delimited payloads cannot carry tabs or line breaks.
fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}
