/*!
 * Optimization session: runs one background worker at a time against a loaded
 * collection and applies its events to the table model.
 *
 * States: `Idle -> Running -> {Finished, Failed}`. A finished or failed session can
 * start a new run; starting while running is rejected.
 */

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::{SessionError, WorkerError};
use crate::subtitle_processor::SubtitleEntry;
use crate::table_model::SubtitleTableModel;
use crate::translation::{SubtitleWorker, WorkerEvents};

use super::models::{SessionNotice, SessionState, Task, TaskConfig, TaskStatus, WorkerEvent};

/// Session driving a single worker run
pub struct OptimizationSession {
    state: SessionState,
    task: Option<Task>,
    events: Option<UnboundedReceiver<WorkerEvent>>,
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl Default for OptimizationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            task: None,
            events: None,
            handle: None,
            cancel: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the "start" affordance should be enabled
    pub fn can_start(&self) -> bool {
        self.state != SessionState::Running
    }

    /// Latest task snapshot seen by the session
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Copy `config` onto `task` and spawn `worker` on the current tokio runtime
    pub fn start(
        &mut self,
        mut task: Task,
        config: TaskConfig,
        worker: Arc<dyn SubtitleWorker>,
        subtitles: Vec<SubtitleEntry>,
    ) -> Result<(), SessionError> {
        if !self.can_start() {
            return Err(SessionError::AlreadyRunning);
        }

        task.apply_config(config);
        info!(
            "Starting run for task {} ({} cues, optimize={}, translate={})",
            task.short_id(),
            subtitles.len(),
            task.config.need_optimize,
            task.config.need_translate
        );

        let (sender, receiver) = mpsc::unbounded_channel();
        let events = WorkerEvents::new(sender.clone());
        let token = CancellationToken::new();
        let child_token = token.clone();
        let run_task = task.clone();

        let handle = tokio::spawn(async move {
            let outcome = worker.run(run_task, subtitles, events, child_token).await;
            let event = match outcome {
                Ok(task) => WorkerEvent::Finished(task),
                Err(WorkerError::Cancelled) => {
                    debug!("Worker stopped after cancellation");
                    return;
                }
                Err(e) => WorkerEvent::Error(e.to_string()),
            };
            let _ = sender.send(event);
        });

        self.task = Some(task);
        self.events = Some(receiver);
        self.handle = Some(handle);
        self.cancel = Some(token);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Wait for the next worker event. Returns `None` when no run is active.
    /// A worker that goes away without a terminal event is reported as an error.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        let receiver = self.events.as_mut()?;
        match receiver.recv().await {
            Some(event) => Some(event),
            None if self.state == SessionState::Running => {
                self.events = None;
                Some(WorkerEvent::Error("worker stopped without reporting a result".to_string()))
            }
            None => {
                self.events = None;
                None
            }
        }
    }

    /// Apply one event to the model and report what the caller should show
    pub fn handle_event(&mut self, event: WorkerEvent, model: &mut SubtitleTableModel) -> Option<SessionNotice> {
        if self.state != SessionState::Running {
            warn!("Dropping worker event received while {:?}", self.state);
            return None;
        }

        match event {
            WorkerEvent::Progress { percent, status } => {
                debug!("Progress {}%: {}", percent, status);
                Some(SessionNotice::Progress { percent, status })
            }
            WorkerEvent::PartialUpdate(updates) => {
                let report = model.update_data(&updates);
                for id in &report.ignored {
                    debug!("Worker update for unknown cue {} dropped", id);
                }
                Some(SessionNotice::Updated(report))
            }
            WorkerEvent::FullUpdate(entries) => {
                model.update_all(entries);
                Some(SessionNotice::Relayout { rows: model.row_count() })
            }
            WorkerEvent::Finished(task) => {
                self.finish_run(SessionState::Finished);
                info!("Run for task {} finished ({:?})", task.short_id(), task.status);
                self.task = Some(task.clone());
                if task.status == TaskStatus::Pending {
                    Some(SessionNotice::DownstreamReady(task))
                } else {
                    Some(SessionNotice::Completed(task))
                }
            }
            WorkerEvent::Error(message) => {
                self.finish_run(SessionState::Failed);
                error!("Optimization failed: {}", message);
                if let Some(task) = self.task.as_mut() {
                    task.status = TaskStatus::Failed;
                }
                Some(SessionNotice::Failed(message))
            }
        }
    }

    /// Request the worker to stop without waiting for it
    pub fn cancel(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.events = None;
        if let Some(task) = self.task.as_mut() {
            task.status = TaskStatus::Canceled;
        }
        self.state = SessionState::Idle;
        info!("Optimization run cancelled");
    }

    fn finish_run(&mut self, state: SessionState) {
        self.state = state;
        self.events = None;
        self.handle = None;
        self.cancel = None;
    }
}

impl Drop for OptimizationSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
