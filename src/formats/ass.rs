use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::subtitle_processor::SubtitleEntry;
use super::{empty_error, SubtitleFormat};

static ASS_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{2})$").unwrap()
});

// @const: Override blocks such as {\an8} or {\i1}
static OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

const HEADER: &str = "[Script Info]
ScriptType: v4.00+
PlayResX: 1280
PlayResY: 720
WrapStyle: 0

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,20,20,30,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// h:mm:ss.cc, milliseconds truncated to centiseconds
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

fn parse_timestamp(value: &str) -> Option<u64> {
    let caps = ASS_TIME_REGEX.captures(value.trim())?;
    let part = |i: usize| -> u64 { caps.get(i).map_or(0, |m| m.as_str().parse().unwrap_or(0)) };
    Some((part(1) * 3600 + part(2) * 60 + part(3)) * 1000 + part(4) * 10)
}

fn parse_error(message: impl Into<String>) -> SubtitleError {
    SubtitleError::Parse {
        format: SubtitleFormat::Ass.to_string(),
        message: message.into(),
    }
}

/// Parse the [Events] section. Field positions come from its Format line; Text
/// is always the last field and may contain commas.
pub fn parse(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let mut in_events = false;
    let mut fields: Option<Vec<String>> = None;
    let mut entries = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(format) = line.strip_prefix("Format:") {
            fields = Some(format.split(',').map(|f| f.trim().to_lowercase()).collect());
            continue;
        }

        let Some(dialogue) = line.strip_prefix("Dialogue:") else {
            continue;
        };
        let fields = fields.as_ref().ok_or_else(|| parse_error("Dialogue before Format line"))?;
        let position = |name: &str| fields.iter().position(|f| f == name);
        let (Some(start_idx), Some(end_idx), Some(text_idx)) = (position("start"), position("end"), position("text")) else {
            return Err(parse_error("Format line lacks Start, End or Text"));
        };

        let values: Vec<&str> = dialogue.trim_start().splitn(fields.len(), ',').collect();
        if values.len() != fields.len() {
            warn!("Skipping malformed dialogue line: {}", line);
            continue;
        }

        let (Some(start), Some(end)) = (parse_timestamp(values[start_idx]), parse_timestamp(values[end_idx])) else {
            warn!("Skipping dialogue with bad timing: {}", line);
            continue;
        };

        let text = OVERRIDE_REGEX
            .replace_all(values[text_idx], "")
            .replace("\\N", "\n")
            .replace("\\n", "\n")
            .replace("\\h", " ");

        let id = entries.len() + 1;
        entries.push(SubtitleEntry::from_cue_text(id, start, end, &text));
    }

    if entries.is_empty() {
        return Err(empty_error(SubtitleFormat::Ass));
    }
    Ok(entries)
}

pub fn serialize(entries: &[SubtitleEntry]) -> String {
    let mut out = String::from(HEADER);
    for entry in entries {
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_timestamp(entry.start_time_ms),
            format_timestamp(entry.end_time_ms),
            entry.cue_text().replace('\n', "\\N")
        ));
    }
    out
}
