/*!
 * Background subtitle workers.
 *
 * A worker receives a snapshot of the cues and a [`WorkerEvents`] sender. It
 * reports progress and corrections through the sender only and never touches the
 * table model. The session turns the worker's return value into the terminal
 * `Finished` or `Error` event.
 */

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::errors::WorkerError;
use crate::session::{Task, UpdateMap, WorkerEvent};
use crate::subtitle_processor::SubtitleEntry;

pub mod optimizer;
pub mod prompts;

pub use optimizer::SubtitleOptimizer;

/// Sending half handed to a worker run
#[derive(Debug, Clone)]
pub struct WorkerEvents {
    sender: UnboundedSender<WorkerEvent>,
}

impl WorkerEvents {
    pub fn new(sender: UnboundedSender<WorkerEvent>) -> Self {
        Self { sender }
    }

    /// Returns false once nobody is listening any more
    pub fn progress(&self, percent: u8, status: impl Into<String>) -> bool {
        self.send(WorkerEvent::Progress { percent: percent.min(100), status: status.into() })
    }

    pub fn partial_update(&self, updates: UpdateMap) -> bool {
        if updates.is_empty() {
            return true;
        }
        self.send(WorkerEvent::PartialUpdate(updates))
    }

    pub fn full_update(&self, entries: Vec<SubtitleEntry>) -> bool {
        self.send(WorkerEvent::FullUpdate(entries))
    }

    fn send(&self, event: WorkerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// A background pass over the subtitles of a task
#[async_trait]
pub trait SubtitleWorker: Send + Sync {
    /// Run to completion and return the final task snapshot. Implementations
    /// should return [`WorkerError::Cancelled`] promptly once `cancel` fires.
    async fn run(
        &self,
        task: Task,
        subtitles: Vec<SubtitleEntry>,
        events: WorkerEvents,
        cancel: CancellationToken,
    ) -> Result<Task, WorkerError>;
}
