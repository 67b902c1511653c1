/*!
 * Scripted worker implementations for testing
 *
 * These workers emit a fixed list of events and return a fixed result, so
 * session and controller behavior can be tested without any LLM.
 */

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use subforge::errors::WorkerError;
use subforge::session::{Task, TaskStatus, UpdateMap};
use subforge::subtitle_processor::{CueId, SubtitleEntry};
use subforge::translation::{SubtitleWorker, WorkerEvents};

/// One step of a scripted run
#[derive(Debug, Clone)]
pub enum Step {
    Progress(u8, &'static str),
    Partial(Vec<(&'static str, &'static str)>),
    Full(Vec<SubtitleEntry>),
}

/// How a scripted run ends
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return the task with this status
    Finish(TaskStatus),
    /// Fail with this message
    Fail(&'static str),
}

/// Worker replaying a script
#[derive(Debug)]
pub struct ScriptedWorker {
    steps: Vec<Step>,
    outcome: Outcome,
    /// When set, the run waits for a notification before finishing
    gate: Option<Arc<Notify>>,
}

impl ScriptedWorker {
    pub fn new(steps: Vec<Step>, outcome: Outcome) -> Self {
        Self { steps, outcome, gate: None }
    }

    /// Worker that finishes immediately with the given status
    pub fn finishing(status: TaskStatus) -> Self {
        Self::new(vec![Step::Progress(100, "done")], Outcome::Finish(status))
    }

    /// Worker that stays running until the returned gate is notified
    pub fn gated(outcome: Outcome) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let worker = Self { steps: Vec::new(), outcome, gate: Some(gate.clone()) };
        (worker, gate)
    }
}

#[async_trait]
impl SubtitleWorker for ScriptedWorker {
    async fn run(
        &self,
        mut task: Task,
        _subtitles: Vec<SubtitleEntry>,
        events: WorkerEvents,
        cancel: CancellationToken,
    ) -> Result<Task, WorkerError> {
        for step in &self.steps {
            match step {
                Step::Progress(percent, status) => {
                    events.progress(*percent, *status);
                }
                Step::Partial(pairs) => {
                    let updates: UpdateMap = pairs
                        .iter()
                        .map(|(id, value)| (CueId::from(*id), value.to_string()))
                        .collect();
                    events.partial_update(updates);
                }
                Step::Full(entries) => {
                    events.full_update(entries.clone());
                }
            }
        }

        if let Some(gate) = &self.gate {
            tokio::select! {
                _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
                _ = gate.notified() => {}
            }
        }

        match &self.outcome {
            Outcome::Finish(status) => {
                task.status = *status;
                Ok(task)
            }
            Outcome::Fail(message) => Err(WorkerError::Failed(message.to_string())),
        }
    }
}
