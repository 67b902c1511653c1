/*!
 * Session-specific models.
 *
 * A [`Task`] describes one subtitle file and the configuration snapshot a run
 * works with; [`WorkerEvent`] is what a background worker emits and
 * [`SessionNotice`] is what the session hands back to its caller after an event
 * has been applied.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::subtitle_processor::{CueId, PartialUpdate, SubtitleEntry};

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for (further) processing
    Pending,
    Completed,
    Failed,
    Canceled,
}

/// Whether the optimization run is the whole job or a stage of a larger one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Optimize a subtitle file on its own
    Standalone,
    /// Optimization precedes a downstream stage; the task stays pending
    Pipeline,
}

/// Configuration captured when a run starts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    pub need_optimize: bool,
    pub need_translate: bool,
    pub api_key: String,
    pub base_url: String,
    pub llm_model: String,
    pub batch_size: usize,
    pub thread_num: usize,
    pub target_language: String,
}

/// One subtitle file and the run configuration applied to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub file_path: PathBuf,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub config: TaskConfig,
    pub created_at: String,
}

impl Task {
    pub fn new(file_path: impl Into<PathBuf>, kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_path: file_path.into(),
            kind,
            status: TaskStatus::Pending,
            config: TaskConfig::default(),
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// Task for optimizing a single subtitle file
    pub fn subtitle_optimization(file_path: impl Into<PathBuf>) -> Self {
        Self::new(file_path, TaskKind::Standalone)
    }

    pub fn apply_config(&mut self, config: TaskConfig) {
        self.config = config;
    }

    /// First eight characters of the id, for log lines
    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(8).map_or(self.id.len(), |(index, _)| index);
        &self.id[..end]
    }
}

/// Keyed partial update payload
pub type UpdateMap = HashMap<CueId, String>;

/// Events a worker run emits, delivered in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress { percent: u8, status: String },
    PartialUpdate(UpdateMap),
    FullUpdate(Vec<SubtitleEntry>),
    Finished(Task),
    Error(String),
}

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
    Failed,
}

/// Result of handling one worker event, for the caller to display
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Progress { percent: u8, status: String },
    Updated(PartialUpdate),
    Relayout { rows: usize },
    /// Run finished and the task has nothing left to do
    Completed(Task),
    /// Run finished with the task still pending; a downstream stage should start
    DownstreamReady(Task),
    Failed(String),
}

impl SessionNotice {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::DownstreamReady(_) | Self::Failed(_))
    }
}
