use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SubtitleError;
use crate::subtitle_processor::{CueId, SubtitleEntry};
use super::{empty_error, SubtitleFormat};

/// On-disk shape of one cue, keyed by id in the enclosing object
#[derive(Debug, Serialize, Deserialize)]
struct JsonCue {
    start_time: u64,
    end_time: u64,
    #[serde(default)]
    original_subtitle: String,
    #[serde(default)]
    translated_subtitle: String,
}

fn parse_error(message: impl Into<String>) -> SubtitleError {
    SubtitleError::Parse {
        format: SubtitleFormat::Json.to_string(),
        message: message.into(),
    }
}

/// Parse an id-keyed object. Key order is kept, and both text fields are taken
/// verbatim so JSON round-trips exactly.
pub fn parse(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let object: Map<String, Value> =
        serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        let cue: JsonCue = serde_json::from_value(value)
            .map_err(|e| parse_error(format!("cue {}: {}", key, e)))?;
        entries.push(SubtitleEntry {
            id: CueId(key),
            start_time_ms: cue.start_time,
            end_time_ms: cue.end_time,
            original_text: cue.original_subtitle,
            secondary_text: cue.translated_subtitle,
        });
    }

    if entries.is_empty() {
        return Err(empty_error(SubtitleFormat::Json));
    }
    Ok(entries)
}

pub fn serialize(entries: &[SubtitleEntry]) -> Result<String, SubtitleError> {
    let mut object = Map::new();
    for entry in entries {
        let cue = JsonCue {
            start_time: entry.start_time_ms,
            end_time: entry.end_time_ms,
            original_subtitle: entry.original_text.clone(),
            translated_subtitle: entry.secondary_text.clone(),
        };
        let value = serde_json::to_value(cue).map_err(|e| SubtitleError::Serialize {
            path: String::new(),
            message: e.to_string(),
        })?;
        object.insert(entry.id.to_string(), value);
    }

    serde_json::to_string_pretty(&object).map_err(|e| SubtitleError::Serialize {
        path: String::new(),
        message: e.to_string(),
    })
}
