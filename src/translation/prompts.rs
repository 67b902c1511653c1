/*!
 * Prompt templates for subtitle optimization and translation.
 *
 * Every request carries a JSON object mapping cue ids to their text; the model
 * must answer with an object using the same keys.
 */

use serde_json::{Map, Value};

use crate::subtitle_processor::SubtitleEntry;

/// What a run asks the model to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Optimize,
    Translate,
    OptimizeAndTranslate,
}

impl PromptKind {
    /// None when neither step is enabled
    pub fn from_flags(need_optimize: bool, need_translate: bool) -> Option<Self> {
        match (need_optimize, need_translate) {
            (true, false) => Some(Self::Optimize),
            (false, true) => Some(Self::Translate),
            (true, true) => Some(Self::OptimizeAndTranslate),
            (false, false) => None,
        }
    }

    pub fn translates(self) -> bool {
        !matches!(self, Self::Optimize)
    }
}

const OPTIMIZE_PROMPT: &str = r#"You are a subtitle proofreader. The input is a JSON object whose keys are subtitle ids and whose values are lines produced by speech recognition.

## Task
- Fix misrecognized words, typos, and punctuation
- Remove filler words and stutters that add nothing
- Keep the meaning, tone, and language of each line
- Never merge, split, or reorder lines

## Output
Return ONLY a JSON object with exactly the same keys, each mapped to the corrected line."#;

const TRANSLATE_PROMPT: &str = r#"You are an expert subtitle translator. The input is a JSON object whose keys are subtitle ids and whose values are subtitle lines.

## Task
- Translate every line into {target_language}
- Translate naturally and keep lines concise; subtitles have limited display time
- Preserve [sound effects] and (parentheticals) as formatted
- Never merge, split, or reorder lines

## Output
Return ONLY a JSON object with exactly the same keys, each mapped to its translation."#;

const OPTIMIZE_AND_TRANSLATE_PROMPT: &str = r#"You are a subtitle editor and translator. The input is a JSON object whose keys are subtitle ids and whose values are lines produced by speech recognition.

## Task
- First silently correct recognition errors, typos, and punctuation
- Then translate the corrected line into {target_language}
- Keep lines concise; subtitles have limited display time
- Never merge, split, or reorder lines

## Output
Return ONLY a JSON object with exactly the same keys. Map each key to an object with two fields:
- "optimized": the corrected line in its original language
- "translation": the translation of the corrected line

Example: {"1": {"optimized": "corrected line", "translation": "translated line"}}"#;

/// System prompt for `kind`
pub fn system_prompt(kind: PromptKind, target_language: &str) -> String {
    match kind {
        PromptKind::Optimize => OPTIMIZE_PROMPT.to_string(),
        PromptKind::Translate => TRANSLATE_PROMPT.replace("{target_language}", target_language),
        PromptKind::OptimizeAndTranslate => {
            OPTIMIZE_AND_TRANSLATE_PROMPT.replace("{target_language}", target_language)
        }
    }
}

/// User message for one batch: an ordered id -> original text object
pub fn user_message(batch: &[SubtitleEntry]) -> String {
    let payload: Map<String, Value> = batch
        .iter()
        .map(|entry| (entry.id.to_string(), Value::String(entry.original_text.clone())))
        .collect();

    format!(
        "Process the following subtitles:\n{}",
        Value::Object(payload)
    )
}

/// The model's answer for one cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueAnswer {
    /// Rewritten source line, only when optimizing and translating together
    pub optimized: Option<String>,
    /// Translation, or the rewrite when only optimizing
    pub secondary: String,
}

impl CueAnswer {
    /// Value for a partial update. The projection splits on the first line
    /// break, so a rewritten source goes in front of the secondary text and the
    /// source is left alone otherwise.
    pub fn update_value(&self) -> String {
        match &self.optimized {
            Some(optimized) => format!("{}\n{}", optimized, self.secondary),
            None => self.secondary.clone(),
        }
    }
}

fn single_line(text: &str) -> String {
    text.trim().replace("\r\n", " ").replace('\n', " ")
}

/// Read one cue's value from a model reply. Line breaks are flattened so the
/// value can travel as a single partial-update string.
///
/// Combined runs expect `{"optimized": .., "translation": ..}`; a bare string is
/// taken as the translation alone.
pub fn parse_answer(kind: PromptKind, value: &Value) -> Option<CueAnswer> {
    match (kind, value) {
        (PromptKind::OptimizeAndTranslate, Value::Object(fields)) => {
            let secondary = fields.get("translation")?.as_str()?;
            let optimized = fields
                .get("optimized")
                .and_then(Value::as_str)
                .map(single_line)
                .filter(|text| !text.is_empty());
            Some(CueAnswer { optimized, secondary: single_line(secondary) })
        }
        (_, Value::String(text)) => Some(CueAnswer { optimized: None, secondary: single_line(text) }),
        _ => None,
    }
}

/// Pull the JSON object out of a model reply, tolerating markdown fences and
/// chatter around it
pub fn extract_json_object(reply: &str) -> Option<Map<String, Value>> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
