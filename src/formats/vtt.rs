use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::subtitle_processor::SubtitleEntry;
use super::{empty_error, push_cue_block, trim_trailing_blank, SubtitleFormat};

// @const: Cue timing line, hours optional
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})\s+-->\s+(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})").unwrap()
});

// @const: Inline word timestamp used by YouTube auto captions
static INLINE_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\d{2}:\d{2}:\d{2}\.\d{3}>").unwrap()
});

// @const: Markup tags stripped from cue text
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?(?:c|v|i|b|u|lang|ruby|rt)(?:[.\s][^>]*)?>|<\d{2}:\d{2}:\d{2}\.\d{3}>").unwrap()
});

struct RawCue<'a> {
    start_ms: u64,
    end_ms: u64,
    lines: Vec<&'a str>,
}

pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

fn timing_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 {
        caps.get(start_idx + i).map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
}

fn raw_cues(content: &str) -> Result<Vec<RawCue<'_>>, SubtitleError> {
    if !content.trim_start().starts_with("WEBVTT") {
        return Err(SubtitleError::Parse {
            format: SubtitleFormat::Vtt.to_string(),
            message: "missing WEBVTT header".to_string(),
        });
    }

    let mut cues = Vec::new();
    let mut current: Option<RawCue> = None;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        // Whitespace-only lines belong to the cue; only truly empty lines end it
        if line.is_empty() {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            continue;
        }

        if let Some(caps) = TIMING_REGEX.captures(line.trim()) {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            current = Some(RawCue {
                start_ms: timing_to_ms(&caps, 1),
                end_ms: timing_to_ms(&caps, 5),
                lines: Vec::new(),
            });
        } else if let Some(cue) = current.as_mut() {
            cue.lines.push(line);
        }
        // Header, NOTE, STYLE blocks and cue identifiers fall through here
    }
    if let Some(cue) = current.take() {
        cues.push(cue);
    }

    Ok(cues)
}

fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, "").trim().to_string()
}

/// Generic WebVTT. A whitespace-only line inside a cue stands for an empty
/// text line; cues without text are kept.
pub fn parse(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let mut entries = Vec::new();

    for cue in raw_cues(content)? {
        let mut lines: Vec<String> = cue.lines.iter().map(|l| strip_tags(l)).collect();
        trim_trailing_blank(&mut lines);
        if lines.is_empty() {
            debug!("Empty VTT cue at {}", format_timestamp(cue.start_ms));
        }
        let id = entries.len() + 1;
        entries.push(SubtitleEntry::from_cue_text(id, cue.start_ms, cue.end_ms, &lines.join("\n")));
    }

    if entries.is_empty() {
        return Err(empty_error(SubtitleFormat::Vtt));
    }
    Ok(entries)
}

/// YouTube auto-caption WebVTT. Each cue repeats the previous caption line
/// untagged and carries the new words with inline timestamps; only the tagged
/// lines are kept. Fails when the file has no inline timestamps at all.
pub fn parse_youtube(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    if !INLINE_TIMESTAMP_REGEX.is_match(content) {
        return Err(SubtitleError::Parse {
            format: SubtitleFormat::Vtt.to_string(),
            message: "no inline word timestamps".to_string(),
        });
    }

    let mut entries = Vec::new();
    for cue in raw_cues(content)? {
        let words: Vec<String> = cue
            .lines
            .iter()
            .filter(|l| INLINE_TIMESTAMP_REGEX.is_match(l) || l.contains("<c>"))
            .map(|l| strip_tags(l))
            .filter(|l| !l.is_empty())
            .collect();
        if words.is_empty() {
            continue;
        }
        let id = entries.len() + 1;
        entries.push(SubtitleEntry::new(id, cue.start_ms, cue.end_ms, words.join(" "), ""));
    }

    if entries.is_empty() {
        return Err(empty_error(SubtitleFormat::Vtt));
    }
    Ok(entries)
}

pub fn serialize(entries: &[SubtitleEntry]) -> String {
    let mut out = String::from("WEBVTT\n\n");
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
