/*!
 * Tests for the table projection
 */

use std::collections::HashMap;

use subforge::subtitle_processor::{CueId, SubtitleEntry};
use subforge::table_model::{
    CellIndex, EditTriggers, Orientation, SecondaryMode, SubtitleTableModel, TableChange, COLUMN_COUNT,
};
use crate::common;

fn loaded_model(mode: SecondaryMode, count: usize) -> SubtitleTableModel {
    let mut model = SubtitleTableModel::new(mode, EditTriggers::DEFAULT);
    model.load(common::sample_entries(count));
    model
}

#[test]
fn test_headerData_withTranslateMode_shouldLabelTranslation() {
    let model = loaded_model(SecondaryMode::Translate, 1);
    let headers: Vec<String> = (0..COLUMN_COUNT)
        .filter_map(|section| model.header_data(section, Orientation::Horizontal))
        .collect();

    assert_eq!(headers, vec!["Start", "End", "Original", "Translation"]);
    assert_eq!(model.header_data(4, Orientation::Horizontal), None);
}

#[test]
fn test_headerData_withOptimizeMode_shouldLabelOptimized() {
    let model = loaded_model(SecondaryMode::Optimize, 1);
    assert_eq!(model.header_data(3, Orientation::Horizontal).as_deref(), Some("Optimized"));
    assert_eq!(model.header_data(0, Orientation::Vertical).as_deref(), Some("1"));
    assert_eq!(model.header_data(41, Orientation::Vertical).as_deref(), Some("42"));
}

#[test]
fn test_secondaryMode_fromFlags_shouldFollowTranslateToggle() {
    assert_eq!(SecondaryMode::from_flags(true), SecondaryMode::Translate);
    assert_eq!(SecondaryMode::from_flags(false), SecondaryMode::Optimize);
}

#[test]
fn test_load_shouldReplaceRowsAndRequestRelayout() {
    let mut model = loaded_model(SecondaryMode::Optimize, 5);
    model.take_changes();

    model.load(common::sample_entries(2));
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.column_count(), 4);
    assert_eq!(model.take_changes(), vec![TableChange::LayoutChanged]);
}

#[test]
fn test_updateAll_shouldRequestRelayout() {
    let mut model = loaded_model(SecondaryMode::Optimize, 3);
    model.take_changes();

    let mut entries = common::sample_entries(3);
    entries[1].secondary_text = "done".to_string();
    model.update_all(entries);

    assert_eq!(model.get_cell(1, 3).unwrap(), "done");
    assert_eq!(model.take_changes(), vec![TableChange::LayoutChanged]);
}

#[test]
fn test_updateData_withOnlyUnknownIds_shouldNotNotify() {
    let mut model = loaded_model(SecondaryMode::Optimize, 3);
    model.take_changes();

    let updates: HashMap<CueId, String> = [(CueId::from("42"), "x".to_string())].into_iter().collect();
    let report = model.update_data(&updates);

    assert!(report.is_empty());
    assert!(model.take_changes().is_empty());
}

#[test]
fn test_updateData_shouldNotifyTextColumnsOnly() {
    let mut model = loaded_model(SecondaryMode::Optimize, 4);
    model.take_changes();

    let updates: HashMap<CueId, String> = [(CueId::from("2"), "x".to_string())].into_iter().collect();
    model.update_data(&updates);

    assert_eq!(
        model.take_changes(),
        vec![TableChange::DataChanged { top_left: CellIndex::new(1, 2), bottom_right: CellIndex::new(1, 3) }]
    );
}

#[test]
fn test_setMode_shouldRelayoutOnlyOnChange() {
    let mut model = loaded_model(SecondaryMode::Optimize, 1);
    model.take_changes();

    model.set_mode(SecondaryMode::Optimize);
    assert!(model.take_changes().is_empty());

    model.set_mode(SecondaryMode::Translate);
    assert_eq!(model.take_changes(), vec![TableChange::LayoutChanged]);
}

#[test]
fn test_setCell_onTextColumn_shouldStoreVerbatim() {
    let mut model = SubtitleTableModel::new(SecondaryMode::Optimize, EditTriggers::DEFAULT);
    model.load(vec![SubtitleEntry::new("1", 0, 1, "a", "")]);

    model.set_cell(0, 2, "  spaced\ttext ").unwrap();
    assert_eq!(model.get_cell(0, 2).unwrap(), "  spaced\ttext ");
    assert!(model.flags(3).editable);
}
