/*!
 * Tabular read/write view over a subtitle collection.
 *
 * The model exposes four columns (start, end, original, secondary) and queues
 * change notifications for a presentation layer, which drains them with
 * [`SubtitleTableModel::take_changes`]. Partial worker updates produce a row range
 * notification; full replacements produce a layout notification.
 */

use log::debug;

use crate::errors::TableError;
use crate::subtitle_processor::{
    format_cell_time, Column, CueId, PartialUpdate, SubtitleCollection, SubtitleEntry,
};

pub const COLUMN_COUNT: usize = 4;

/// What the secondary column currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondaryMode {
    Translate,
    #[default]
    Optimize,
}

impl SecondaryMode {
    pub fn from_flags(need_translate: bool) -> Self {
        if need_translate {
            Self::Translate
        } else {
            Self::Optimize
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Translate => "Translation",
            Self::Optimize => "Optimized",
        }
    }
}

/// Gestures that open a cell editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTriggers {
    pub double_click: bool,
    pub edit_key: bool,
}

impl EditTriggers {
    pub const NONE: EditTriggers = EditTriggers { double_click: false, edit_key: false };
    pub const DEFAULT: EditTriggers = EditTriggers { double_click: true, edit_key: true };

    pub fn any(self) -> bool {
        self.double_click || self.edit_key
    }
}

impl Default for EditTriggers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-cell capabilities reported to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFlags {
    pub enabled: bool,
    pub selectable: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellIndex {
    pub row: usize,
    pub column: usize,
}

impl CellIndex {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Change notification for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableChange {
    /// Cells inside the rectangle need a redraw
    DataChanged { top_left: CellIndex, bottom_right: CellIndex },
    /// Rows were replaced, everything needs relayout
    LayoutChanged,
}

/// The projection itself
#[derive(Debug, Default)]
pub struct SubtitleTableModel {
    collection: SubtitleCollection,
    mode: SecondaryMode,
    edit_triggers: EditTriggers,
    changes: Vec<TableChange>,
}

impl SubtitleTableModel {
    pub fn new(mode: SecondaryMode, edit_triggers: EditTriggers) -> Self {
        Self {
            collection: SubtitleCollection::new(),
            mode,
            edit_triggers,
            changes: Vec::new(),
        }
    }

    pub fn with_collection(collection: SubtitleCollection, mode: SecondaryMode) -> Self {
        Self {
            collection,
            mode,
            edit_triggers: EditTriggers::DEFAULT,
            changes: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.collection.len()
    }

    pub fn column_count(&self) -> usize {
        COLUMN_COUNT
    }

    pub fn collection(&self) -> &SubtitleCollection {
        &self.collection
    }

    pub fn mode(&self) -> SecondaryMode {
        self.mode
    }

    /// Switch the secondary column label; the header row is relaid out
    pub fn set_mode(&mut self, mode: SecondaryMode) {
        if self.mode != mode {
            self.mode = mode;
            self.notify_full();
        }
    }

    pub fn edit_triggers(&self) -> EditTriggers {
        self.edit_triggers
    }

    /// Read a cell, formatting time columns as hh:mm:ss.zzz
    pub fn get_cell(&self, row: usize, col: usize) -> Result<String, TableError> {
        let column = Column::from_index(col).ok_or(TableError::ColumnOutOfRange(col))?;
        let entry = self.entry(row)?;

        Ok(match column {
            Column::Start => format_cell_time(entry.start_time_ms),
            Column::End => format_cell_time(entry.end_time_ms),
            Column::Original => entry.original_text.clone(),
            Column::Secondary => entry.secondary_text.clone(),
        })
    }

    /// Write a cell through the collection. Nothing is written or queued on failure.
    pub fn set_cell(&mut self, row: usize, col: usize, value: &str) -> Result<(), TableError> {
        if !self.edit_triggers.any() {
            return Err(TableError::ReadOnly);
        }

        let column = Column::from_index(col).ok_or(TableError::ColumnOutOfRange(col))?;
        let id = self.entry(row)?.id.clone();

        self.collection.edit_cell(&id, column, value)?;

        let cell = CellIndex::new(row, col);
        self.changes.push(TableChange::DataChanged { top_left: cell, bottom_right: cell });
        Ok(())
    }

    pub fn flags(&self, col: usize) -> CellFlags {
        CellFlags {
            enabled: true,
            selectable: true,
            editable: col < COLUMN_COUNT && self.edit_triggers.any(),
        }
    }

    pub fn header_data(&self, section: usize, orientation: Orientation) -> Option<String> {
        match orientation {
            Orientation::Horizontal => {
                let label = match Column::from_index(section)? {
                    Column::Start => "Start",
                    Column::End => "End",
                    Column::Original => "Original",
                    Column::Secondary => self.mode.header(),
                };
                Some(label.to_string())
            }
            Orientation::Vertical => Some((section + 1).to_string()),
        }
    }

    /// Replace the collection with newly loaded data
    pub fn load(&mut self, entries: Vec<SubtitleEntry>) {
        self.collection.load(entries);
        self.notify_full();
    }

    /// Apply a keyed partial update from a worker
    pub fn update_data<'a, I>(&mut self, updates: I) -> PartialUpdate
    where
        I: IntoIterator<Item = (&'a CueId, &'a String)>,
    {
        let report = self.collection.apply_partial_update(updates);
        if !report.ignored.is_empty() {
            debug!("{} update(s) referenced unknown cues", report.ignored.len());
        }
        if let Some((min_row, max_row)) = report.rows {
            self.notify_range(min_row, max_row);
        }
        report
    }

    /// Apply a full replacement from a worker
    pub fn update_all(&mut self, entries: Vec<SubtitleEntry>) {
        self.collection.apply_full_update(entries);
        self.notify_full();
    }

    /// Queue a redraw of the text columns for rows min_row..=max_row
    pub fn notify_range(&mut self, min_row: usize, max_row: usize) {
        self.changes.push(TableChange::DataChanged {
            top_left: CellIndex::new(min_row, Column::Original.index()),
            bottom_right: CellIndex::new(max_row, Column::Secondary.index()),
        });
    }

    pub fn notify_full(&mut self) {
        self.changes.push(TableChange::LayoutChanged);
    }

    /// Drain queued notifications
    pub fn take_changes(&mut self) -> Vec<TableChange> {
        std::mem::take(&mut self.changes)
    }

    fn entry(&self, row: usize) -> Result<&SubtitleEntry, TableError> {
        self.collection.entry_at(row).ok_or(TableError::RowOutOfRange {
            row,
            row_count: self.collection.len(),
        })
    }
}
