use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app_config::Config;
use crate::errors::{AppError, SessionError, SubtitleError};
use crate::file_utils::FileManager;
use crate::formats::{self, SubtitleFormat, SUPPORTED_INPUT_FORMATS};
use crate::session::{OptimizationSession, SessionNotice, Task};
use crate::table_model::{EditTriggers, SecondaryMode, SubtitleTableModel};
use crate::translation::SubtitleWorker;

// @module: Headless subtitle optimization panel

/// Default suffix for saved results, e.g. movie.optimized.srt
pub const OUTPUT_SUFFIX: &str = "optimized";

/// Owns the table model and the session, and exposes the panel's affordances
pub struct Controller {
    // @field: App configuration, snapshotted at every start
    config: Config,

    // @field: Table projection over the loaded collection
    model: SubtitleTableModel,

    // @field: Background run state
    session: OptimizationSession,

    // @field: Task of the loaded file
    task: Option<Task>,

    status: String,
    progress: u8,
    finished_subscribers: Vec<UnboundedSender<Task>>,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Self {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Self {
        let mode = SecondaryMode::from_flags(config.optimization.need_translate);
        Self {
            config,
            model: SubtitleTableModel::new(mode, EditTriggers::DEFAULT),
            session: OptimizationSession::new(),
            task: None,
            status: String::new(),
            progress: 0,
            finished_subscribers: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration; a run already in progress keeps its snapshot
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn model(&self) -> &SubtitleTableModel {
        &self.model
    }

    /// Mutable access for cell edits
    pub fn model_mut(&mut self) -> &mut SubtitleTableModel {
        &mut self.model
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn session(&self) -> &OptimizationSession {
        &self.session
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Start needs a loaded file and no run in progress
    pub fn start_enabled(&self) -> bool {
        self.task.is_some() && self.session.can_start()
    }

    /// File selection is disabled while a run is in progress
    pub fn file_select_enabled(&self) -> bool {
        self.session.can_start()
    }

    /// Receiver yielding the task snapshot each time a run finishes with the
    /// task still pending for a downstream stage
    pub fn subscribe_finished(&mut self) -> UnboundedReceiver<Task> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.finished_subscribers.push(sender);
        receiver
    }

    /// Load a file into the table. On failure the current table and task are kept.
    pub fn load_subtitle_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, AppError> {
        self.load_for_task(Task::subtitle_optimization(path.as_ref()))
    }

    /// Adopt a task handed over by an upstream stage and load its subtitle file
    pub fn set_task(&mut self, task: Task) -> Result<usize, AppError> {
        self.load_for_task(task)
    }

    fn load_for_task(&mut self, task: Task) -> Result<usize, AppError> {
        if !self.session.can_start() {
            return Err(SessionError::AlreadyRunning.into());
        }

        let path = task.file_path.clone();
        let format = SubtitleFormat::from_path(&path)?;
        if !format.is_readable() {
            return Err(SubtitleError::UnsupportedFormat(format.to_string()).into());
        }
        let entries = formats::from_subtitle_file(&path)?;
        let count = entries.len();

        self.model.load(entries);
        self.task = Some(task);
        self.progress = 0;
        self.status = "File loaded".to_string();
        info!("Loaded {} subtitles from {}", count, path.display());
        Ok(count)
    }

    /// Load the first supported regular file among dropped paths. Returns the
    /// loaded path; unsupported entries are skipped with a warning.
    pub fn accept_dropped_files(&mut self, paths: &[PathBuf]) -> Result<PathBuf, AppError> {
        let mut last_error: Option<AppError> = None;

        for path in paths {
            if !FileManager::file_exists(path) {
                debug!("Ignoring dropped non-file {}", path.display());
                continue;
            }
            if !FileManager::is_supported_subtitle(path) {
                let extension = path.extension().unwrap_or_default().to_string_lossy().to_lowercase();
                warn!(
                    "Unsupported subtitle format {}; supported: {}",
                    extension,
                    SUPPORTED_INPUT_FORMATS.iter().map(|f| f.extension()).collect::<Vec<_>>().join(", ")
                );
                last_error = Some(SubtitleError::UnsupportedFormat(extension).into());
                continue;
            }

            self.load_subtitle_file(path)?;
            info!("Imported {}", path.file_name().unwrap_or_default().to_string_lossy());
            return Ok(path.clone());
        }

        Err(last_error.unwrap_or_else(|| AppError::File("No subtitle file was dropped".to_string())))
    }

    /// Default save location next to the loaded file
    pub fn default_save_path(&self, format: SubtitleFormat) -> Result<PathBuf, AppError> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        Ok(FileManager::generate_output_path(&task.file_path, OUTPUT_SUFFIX, format))
    }

    /// Write the table contents. A failed save leaves any existing file untouched.
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: SubtitleFormat) -> Result<(), AppError> {
        if self.task.is_none() {
            return Err(SessionError::NoTask.into());
        }

        let path = path.as_ref();
        match formats::write_subtitle_file(&self.model.collection().serialize(), path, format) {
            Ok(()) => {
                self.status = format!("Saved to {}", path.display());
                info!("Subtitles saved to {}", path.display());
                Ok(())
            }
            Err(e) => {
                error!("Failed to save subtitles: {}", e);
                Err(e.into())
            }
        }
    }

    /// Folder holding the loaded file, for "open folder"
    pub fn output_folder(&self) -> Result<PathBuf, AppError> {
        let task = self.task.as_ref().ok_or(SessionError::NoTask)?;
        Ok(FileManager::containing_folder(&task.file_path))
    }

    /// Snapshot the configuration onto the task and start the worker
    pub fn start(&mut self, worker: Arc<dyn SubtitleWorker>) -> Result<(), AppError> {
        let task = self.task.clone().ok_or(SessionError::NoTask)?;
        let snapshot = self.config.optimization_snapshot();

        self.model.set_mode(SecondaryMode::from_flags(snapshot.need_translate));
        self.session.start(task, snapshot, worker, self.model.collection().serialize())?;

        self.progress = 0;
        self.status = "Optimization started".to_string();
        Ok(())
    }

    /// Wait for and apply the next worker event. `None` once no run is active.
    pub async fn pump(&mut self) -> Option<SessionNotice> {
        loop {
            let event = self.session.next_event().await?;
            let Some(notice) = self.session.handle_event(event, &mut self.model) else {
                continue;
            };
            self.apply_notice(&notice);
            return Some(notice);
        }
    }

    fn apply_notice(&mut self, notice: &SessionNotice) {
        match notice {
            SessionNotice::Progress { percent, status } => {
                self.progress = *percent;
                self.status = status.clone();
            }
            SessionNotice::Updated(_) | SessionNotice::Relayout { .. } => {}
            SessionNotice::Completed(task) => {
                self.task = Some(task.clone());
                self.progress = 100;
                self.status = "Optimization complete".to_string();
            }
            SessionNotice::DownstreamReady(task) => {
                self.task = Some(task.clone());
                self.progress = 100;
                self.status = "Optimization complete".to_string();
                self.finished_subscribers.retain(|s| s.send(task.clone()).is_ok());
            }
            SessionNotice::Failed(message) => {
                if let Some(task) = self.session.task() {
                    self.task = Some(task.clone());
                }
                self.status = format!("Optimization failed: {}", message);
            }
        }
    }

    /// Drive the current run until it finishes or fails
    pub async fn run_to_completion(&mut self) -> Result<Task, AppError> {
        while let Some(notice) = self.pump().await {
            match notice {
                SessionNotice::Completed(task) | SessionNotice::DownstreamReady(task) => return Ok(task),
                SessionNotice::Failed(message) => return Err(AppError::Optimization(message)),
                _ => {}
            }
        }
        Err(SessionError::NoTask.into())
    }

    /// Stop the current run, if any
    pub fn cancel(&mut self) {
        if !self.session.can_start() {
            self.session.cancel();
            if let Some(task) = self.session.task() {
                self.task = Some(task.clone());
            }
            self.status = "Optimization cancelled".to_string();
        }
    }

    /// Teardown: cancel the run without waiting for it
    pub fn shutdown(&mut self) {
        self.cancel();
        self.finished_subscribers.clear();
    }
}
