use pretty_assertions::assert_eq;
use spirit_engine::crosstab::PivotDataTable;
use spirit_engine::datawarrior::{
    ChartKind, DataWarriorConfig, DataWarriorExporter, ExportError,
};
use spirit_model::{
    Aggregation, GroupRef, LabResult, PhaseRef, PivotItem, PivotTemplate, Placement, SampleRef,
};

fn weight(sample: &str, group: &str, phase: &str, rank: u32, value: &str) -> LabResult {
    LabResult::new("Weighing", "Weight", value).with_sample(
        SampleRef::new(sample)
            .with_study("IVV2016-1")
            .with_group(GroupRef::new(group))
            .with_phase(PhaseRef::ranked(phase, rank)),
    )
}

/// Group rows × phase columns, one measurement per cell.
fn simple_table() -> PivotDataTable {
    let results = vec![
        weight("S1", "A", "d1", 1, "10"),
        weight("S1", "A", "d7", 7, "20"),
        weight("S2", "B", "d1", 1, "100"),
        weight("S2", "B", "d7", 7, "110"),
    ];
    let mut template = PivotTemplate::flat();
    template.set_placement(PivotItem::Group, Placement::Row);
    template.set_placement(PivotItem::Phase, Placement::Column);
    PivotDataTable::compute(&results, &template)
}

#[test]
fn exports_fileinfo_table_and_properties() {
    let table = simple_table();
    let config = DataWarriorConfig {
        chart: ChartKind::BoxPlot,
        x_axis: Some("Group".to_string()),
        y_axis: Some("d1".to_string()),
        log_scale: true,
        ..DataWarriorConfig::default()
    };
    let text = DataWarriorExporter::export(&table, &config).unwrap();

    let expected = "<datawarrior-fileinfo>\n\
                    <version=\"3.1\">\n\
                    <rowcount=\"2\">\n\
                    </datawarrior-fileinfo>\n\
                    Group\td1\td7\n\
                    A\t10\t20\n\
                    B\t100\t110\n\
                    <datawarrior properties>\n\
                    <chartType_2D View=\"boxes\">\n\
                    <axisColumn_2D View_0=\"Group\">\n\
                    <axisColumn_2D View_1=\"d1\">\n\
                    <logarithmicView=\"d1\">\n\
                    </datawarrior properties>\n";
    assert_eq!(text, expected);
}

#[test]
fn nested_cells_fail_closed_naming_the_cell() {
    // Two samples of group A measured at d1: the (A, d1) cell holds two
    // nested keys, which the format cannot represent.
    let results = vec![
        weight("S1", "A", "d1", 1, "10"),
        weight("S2", "A", "d1", 1, "20"),
        weight("S3", "B", "d1", 1, "100"),
        weight("S3", "B", "d7", 7, "110"),
    ];
    let mut template = PivotTemplate::flat();
    template.set_placement(PivotItem::Group, Placement::Row);
    template.set_placement(PivotItem::Phase, Placement::Column);
    let table = PivotDataTable::compute(&results, &template);

    let err = DataWarriorExporter::export(&table, &DataWarriorConfig::default()).unwrap_err();
    match err {
        ExportError::NestedCell { row, column, keys } => {
            assert_eq!(row, "A");
            assert_eq!(column, "d1");
            assert_eq!(keys, 2);
        }
        other => panic!("expected NestedCell, got {other:?}"),
    }
}

#[test]
fn computed_aggregation_emits_value_and_count_columns() {
    // Nested sample detail collapsed by averaging.
    let results = vec![
        weight("S1", "A", "d1", 1, "10"),
        weight("S1", "A", "d1", 1, "20"),
        weight("S2", "B", "d1", 1, "100"),
    ];
    let mut template = PivotTemplate::flat();
    template.set_placement(PivotItem::Group, Placement::Row);
    template.set_placement(PivotItem::Phase, Placement::Column);
    template.computed = Some(Aggregation::Average);
    let table = PivotDataTable::compute(&results, &template);

    let text = DataWarriorExporter::export(&table, &DataWarriorConfig::default()).unwrap();
    let mut lines = text.lines().skip(4);
    assert_eq!(lines.next(), Some("Group\td1\td1 N"));
    assert_eq!(lines.next(), Some("A\t15\t2"));
    assert_eq!(lines.next(), Some("B\t100\t1"));
}

#[test]
fn selected_columns_restrict_the_export() {
    let table = simple_table();
    let config = DataWarriorConfig {
        selected_columns: Some(vec!["d7".to_string()]),
        ..DataWarriorConfig::default()
    };
    let text = DataWarriorExporter::export(&table, &config).unwrap();
    assert!(text.contains("Group\td7\n"));
    assert!(!text.contains("\td1"));
}

#[test]
fn unknown_selected_column_is_an_error() {
    let table = simple_table();
    let config = DataWarriorConfig {
        selected_columns: Some(vec!["d99".to_string()]),
        ..DataWarriorConfig::default()
    };
    let err = DataWarriorExporter::export(&table, &config).unwrap_err();
    assert!(matches!(err, ExportError::UnknownColumn(name) if name == "d99"));
}

#[test]
fn unknown_axis_is_an_error() {
    let table = simple_table();
    let config = DataWarriorConfig {
        y_axis: Some("NoSuchColumn".to_string()),
        ..DataWarriorConfig::default()
    };
    let err = DataWarriorExporter::export(&table, &config).unwrap_err();
    assert!(matches!(err, ExportError::UnknownColumn(name) if name == "NoSuchColumn"));
}

#[test]
fn config_serde_roundtrips() {
    let config = DataWarriorConfig {
        chart: ChartKind::Whiskers,
        y_axis: Some("d1".to_string()),
        log_scale: true,
        selected_columns: Some(vec!["d1".to_string()]),
        ..DataWarriorConfig::default()
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json.get("chart").and_then(|v| v.as_str()), Some("whiskers"));
    let decoded: DataWarriorConfig = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, config);
}

#[test]
fn empty_table_has_nothing_to_export() {
    let template = PivotTemplate::flat();
    let table = PivotDataTable::compute(&[], &template);
    let err = DataWarriorExporter::export(&table, &DataWarriorConfig::default()).unwrap_err();
    assert!(matches!(err, ExportError::NoColumns));
}
