/*!
 * Subtitle file formats.
 *
 * Readers turn file text into an ordered list of [`SubtitleEntry`] values with ids
 * `"1"`, `"2"`, ...; writers do the reverse. A cue's text block is split on its
 * first line break into original and secondary text, and joined back the same way.
 *
 * Precision: SRT, WebVTT and JSON keep milliseconds; ASS keeps centiseconds.
 * TXT is write-only and carries no timing.
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::SubtitleEntry;

pub mod ass;
pub mod json;
pub mod srt;
pub mod vtt;

/// Known subtitle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
    Ass,
    Json,
    Txt,
}

/// Formats accepted when loading or dropping a file
pub const SUPPORTED_INPUT_FORMATS: [SubtitleFormat; 4] =
    [SubtitleFormat::Srt, SubtitleFormat::Vtt, SubtitleFormat::Ass, SubtitleFormat::Json];

/// Formats offered when saving
pub const SUPPORTED_OUTPUT_FORMATS: [SubtitleFormat; 5] = [
    SubtitleFormat::Srt,
    SubtitleFormat::Vtt,
    SubtitleFormat::Ass,
    SubtitleFormat::Json,
    SubtitleFormat::Txt,
];

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
            Self::Json => "json",
            Self::Txt => "txt",
        }
    }

    pub fn is_readable(self) -> bool {
        SUPPORTED_INPUT_FORMATS.contains(&self)
    }

    /// Format from a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, SubtitleError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        ext.parse()
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            "ass" => Ok(Self::Ass),
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Txt),
            other => Err(SubtitleError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parse subtitle text in the given format.
///
/// WebVTT first tries the YouTube word-timed flavour and falls back to the
/// generic parser.
pub fn parse(content: &str, format: SubtitleFormat) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let content = content.trim_start_matches('\u{feff}');
    match format {
        SubtitleFormat::Srt => srt::parse(content),
        SubtitleFormat::Vtt => vtt::parse_youtube(content).or_else(|e| {
            debug!("Not a YouTube VTT ({}), using generic parser", e);
            vtt::parse(content)
        }),
        SubtitleFormat::Ass => ass::parse(content),
        SubtitleFormat::Json => json::parse(content),
        SubtitleFormat::Txt => Err(SubtitleError::UnsupportedFormat("txt".to_string())),
    }
}

/// Render entries in the given format
pub fn serialize(entries: &[SubtitleEntry], format: SubtitleFormat) -> Result<String, SubtitleError> {
    Ok(match format {
        SubtitleFormat::Srt => srt::serialize(entries),
        SubtitleFormat::Vtt => vtt::serialize(entries),
        SubtitleFormat::Ass => ass::serialize(entries),
        SubtitleFormat::Json => json::serialize(entries)?,
        SubtitleFormat::Txt => entries
            .iter()
            .map(|e| format!("{}\n", e.cue_text()))
            .collect(),
    })
}

/// Load and parse a subtitle file, detecting the format from its extension
pub fn from_subtitle_file<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let path = path.as_ref();
    let format = SubtitleFormat::from_path(path)?;
    if !format.is_readable() {
        return Err(SubtitleError::UnsupportedFormat(format.to_string()));
    }

    let content = FileManager::read_to_string(path).map_err(|e| SubtitleError::Io(e.to_string()))?;
    let entries = parse(&content, format)?;
    debug!("Parsed {} cue(s) from {}", entries.len(), path.display());
    Ok(entries)
}

/// Write entries to `path`. The destination is only replaced once the whole file
/// has been written.
pub fn write_subtitle_file<P: AsRef<Path>>(
    entries: &[SubtitleEntry],
    path: P,
    format: SubtitleFormat,
) -> Result<(), SubtitleError> {
    let path = path.as_ref();
    let content = serialize(entries, format)?;

    FileManager::write_atomic(path, &content).map_err(|e| SubtitleError::Serialize {
        path: path.display().to_string(),
        message: format!("{:#}", e),
    })?;

    info!("Saved {} cue(s) to {}", entries.len(), path.display());
    Ok(())
}

/// Cue text for block formats (SRT, WebVTT). An empty line would end the cue
/// there, so blank lines inside the text are written as a single space. An
/// empty cue has no text lines at all.
pub(crate) fn cue_body(entry: &SubtitleEntry) -> String {
    let text = entry.cue_text();
    if text.is_empty() {
        return text;
    }
    text.split('\n')
        .map(|line| if line.trim().is_empty() { " " } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append one numbered cue block, timing line and text, to `out`
pub(crate) fn push_cue_block(out: &mut String, number: usize, timing: &str, entry: &SubtitleEntry) {
    out.push_str(&format!("{}\n{}\n", number, timing));
    let body = cue_body(entry);
    if !body.is_empty() {
        out.push_str(&body);
        out.push('\n');
    }
    out.push('\n');
}

/// Drop trailing blank lines of a cue's text
pub(crate) fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
}

/// Shared "no cues" error for text parsers
pub(crate) fn empty_error(format: SubtitleFormat) -> SubtitleError {
    SubtitleError::Parse {
        format: format.to_string(),
        message: "no subtitle entries found".to_string(),
    }
}
