use std::collections::HashMap;
use std::fmt;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

// @module: In-memory subtitle collection and cue editing

const MS_PER_DAY: u64 = 86_400_000;

// @const: Strict hh:mm:ss.zzz cell format
static CELL_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):([0-5]\d):([0-5]\d)\.(\d{3})$").unwrap()
});

/// Stable, process-local identifier of a cue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CueId(pub String);

impl CueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CueId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<usize> for CueId {
    fn from(index: usize) -> Self {
        Self(index.to_string())
    }
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Identifier, unique within a collection
    pub id: CueId,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms (not required to be >= start)
    pub end_time_ms: u64,

    // @field: Source text, may span lines
    pub original_text: String,

    // @field: Translation or optimized rewrite
    pub secondary_text: String,
}

impl SubtitleEntry {
    pub fn new(
        id: impl Into<CueId>,
        start_time_ms: u64,
        end_time_ms: u64,
        original_text: impl Into<String>,
        secondary_text: impl Into<String>,
    ) -> Self {
        SubtitleEntry {
            id: id.into(),
            start_time_ms,
            end_time_ms,
            original_text: original_text.into(),
            secondary_text: secondary_text.into(),
        }
    }

    /// Build an entry from a cue's full text block, taking the first line break
    /// as the separator between original and secondary text
    pub fn from_cue_text(id: impl Into<CueId>, start_time_ms: u64, end_time_ms: u64, text: &str) -> Self {
        let (original, secondary) = split_first_line(text);
        Self::new(id, start_time_ms, end_time_ms, original, secondary.unwrap_or_default())
    }

    /// Text of the cue as written to a subtitle file
    pub fn cue_text(&self) -> String {
        if self.secondary_text.is_empty() {
            self.original_text.clone()
        } else {
            format!("{}\n{}", self.original_text, self.secondary_text)
        }
    }

    /// Duration in milliseconds, zero for inverted cues
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }
}

/// Split on the first line break only
pub fn split_first_line(value: &str) -> (&str, Option<&str>) {
    match value.split_once('\n') {
        Some((head, tail)) => (head.trim_end_matches('\r'), Some(tail)),
        None => (value, None),
    }
}

/// Format milliseconds as a wall-clock cell value (hh:mm:ss.zzz, wraps at 24h)
pub fn format_cell_time(ms: u64) -> String {
    let ms = ms % MS_PER_DAY;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Parse an hh:mm:ss.zzz cell value to milliseconds from midnight
pub fn parse_cell_time(value: &str) -> Result<u64, SubtitleError> {
    let caps = CELL_TIME_REGEX
        .captures(value)
        .ok_or_else(|| SubtitleError::TimeFormat(value.to_string()))?;

    let part = |i: usize| -> u64 {
        caps.get(i).map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };

    Ok(part(1) * 3_600_000 + part(2) * 60_000 + part(3) * 1_000 + part(4))
}

/// Editable field of a cue, in table column order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Start,
    End,
    Original,
    Secondary,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Start, Column::End, Column::Original, Column::Secondary];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_time(self) -> bool {
        matches!(self, Column::Start | Column::End)
    }
}

/// Outcome of a keyed partial update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialUpdate {
    /// Smallest and largest row touched, if any
    pub rows: Option<(usize, usize)>,
    /// Ids in the update that are not in the collection
    pub ignored: Vec<CueId>,
}

impl PartialUpdate {
    pub fn is_empty(&self) -> bool {
        self.rows.is_none()
    }
}

/// Ordered mapping from cue id to cue
#[derive(Debug, Clone, Default)]
pub struct SubtitleCollection {
    entries: Vec<SubtitleEntry>,
    positions: HashMap<CueId, usize>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from parsed data
    pub fn from_entries(entries: Vec<SubtitleEntry>) -> Self {
        let mut collection = Self::new();
        collection.load(entries);
        collection
    }

    /// Replace the whole backing store. Time order is not validated.
    pub fn load(&mut self, entries: Vec<SubtitleEntry>) {
        self.entries.clear();
        self.positions.clear();

        for entry in entries {
            match self.positions.get(&entry.id) {
                Some(&pos) => {
                    warn!("Duplicate cue id {} in loaded data, keeping the later cue", entry.id);
                    self.entries[pos] = entry;
                }
                None => {
                    self.positions.insert(entry.id.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
    }

    /// Full replacement pushed by a worker
    pub fn apply_full_update(&mut self, entries: Vec<SubtitleEntry>) {
        self.load(entries);
    }

    /// Apply worker corrections keyed by cue id.
    ///
    /// A value containing a line break sets both texts (split on the first break),
    /// anything else only replaces the secondary text. Unknown ids are skipped.
    pub fn apply_partial_update<'a, I>(&mut self, updates: I) -> PartialUpdate
    where
        I: IntoIterator<Item = (&'a CueId, &'a String)>,
    {
        let mut report = PartialUpdate::default();

        for (id, value) in updates {
            let Some(&row) = self.positions.get(id) else {
                debug!("Ignoring update for unknown cue {}", id);
                report.ignored.push(id.clone());
                continue;
            };

            let entry = &mut self.entries[row];
            match split_first_line(value) {
                (head, Some(tail)) => {
                    entry.original_text = head.to_string();
                    entry.secondary_text = tail.to_string();
                }
                (text, None) => entry.secondary_text = text.to_string(),
            }

            report.rows = Some(match report.rows {
                Some((min, max)) => (min.min(row), max.max(row)),
                None => (row, row),
            });
        }

        report
    }

    /// Edit one field of a cue
    pub fn edit_cell(&mut self, id: &CueId, column: Column, value: &str) -> Result<(), SubtitleError> {
        let row = self.row_of(id).ok_or_else(|| SubtitleError::UnknownCue(id.to_string()))?;
        let entry = &mut self.entries[row];

        match column {
            Column::Start => entry.start_time_ms = parse_cell_time(value)?,
            Column::End => entry.end_time_ms = parse_cell_time(value)?,
            Column::Original => entry.original_text = value.to_string(),
            Column::Secondary => entry.secondary_text = value.to_string(),
        }

        Ok(())
    }

    /// Ordered snapshot for a subtitle writer
    pub fn serialize(&self) -> Vec<SubtitleEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn get(&self, id: &CueId) -> Option<&SubtitleEntry> {
        self.row_of(id).map(|row| &self.entries[row])
    }

    pub fn entry_at(&self, row: usize) -> Option<&SubtitleEntry> {
        self.entries.get(row)
    }

    pub fn id_at(&self, row: usize) -> Option<&CueId> {
        self.entries.get(row).map(|e| &e.id)
    }

    pub fn row_of(&self, id: &CueId) -> Option<usize> {
        self.positions.get(id).copied()
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
