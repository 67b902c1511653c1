use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::subtitle_processor::SubtitleEntry;
use super::{empty_error, push_cue_block, trim_trailing_blank, SubtitleFormat};

// @const: SRT timestamp regex (accepts '.' for sloppy writers)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

pub(crate) fn captures_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 {
        caps.get(start_idx + i).map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
}

/// Whether `line` is a bare cue counter
fn is_counter(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}

/// Remove the next cue's counter from the end of a cue's raw lines. The counter
/// sits right before the timing line, after a blank line unless the cue has no
/// text at all.
fn strip_next_counter(lines: &mut Vec<&str>) {
    let Some(last) = lines.len().checked_sub(1) else {
        return;
    };
    if is_counter(lines[last]) && (last == 0 || lines[last - 1].trim().is_empty()) {
        lines.truncate(last);
    }
}

/// Parse SRT content. Cues start at their timing line and run until the next
/// one; the numeric counter is optional and ignored, ids are assigned in file
/// order. Cues with no text are kept.
pub fn parse(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues: Vec<(u64, u64, Vec<&str>)> = Vec::new();

    for line in normalized.lines() {
        if let Some(caps) = TIMESTAMP_REGEX.captures(line) {
            if let Some((_, _, lines)) = cues.last_mut() {
                strip_next_counter(lines);
            }
            cues.push((captures_to_ms(&caps, 1), captures_to_ms(&caps, 5), Vec::new()));
        } else if let Some((_, _, lines)) = cues.last_mut() {
            lines.push(line);
        } else if !line.trim().is_empty() && !is_counter(line) {
            warn!("Skipping SRT text before the first timestamp: {}", line);
        }
    }

    let mut entries = Vec::with_capacity(cues.len());
    for (start_ms, end_ms, lines) in cues {
        let mut text: Vec<String> = lines.iter().map(|l| l.trim().to_string()).collect();
        trim_trailing_blank(&mut text);

        let id = entries.len() + 1;
        entries.push(SubtitleEntry::from_cue_text(id, start_ms, end_ms, &text.join("\n")));
    }

    if entries.is_empty() {
        return Err(empty_error(SubtitleFormat::Srt));
    }
    Ok(entries)
}

pub fn serialize(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let timing = format!(
            "{} --> {}",
            format_timestamp(entry.start_time_ms),
            format_timestamp(entry.end_time_ms)
        );
        push_cue_block(&mut out, i + 1, &timing, entry);
    }
    out
}
