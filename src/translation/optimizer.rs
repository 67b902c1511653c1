/*!
 * LLM-backed subtitle worker.
 *
 * Splits the cues into batches, sends each batch to a chat provider with at most
 * `thread_num` requests in flight, and streams every answered batch back as a
 * partial update. A final full update carries the merged result.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app_config::OptimizationConfig;
use crate::errors::WorkerError;
use crate::language_utils;
use crate::providers::openai::OpenAI;
use crate::providers::{ChatProvider, ChatRequest};
use crate::session::{Task, TaskConfig, TaskKind, TaskStatus, UpdateMap};
use crate::subtitle_processor::{CueId, SubtitleEntry};

use super::prompts::{self, CueAnswer, PromptKind};
use super::{SubtitleWorker, WorkerEvents};

/// Request tuning that is not part of the task snapshot
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    pub temperature: f32,
    pub timeout_secs: u64,
    pub retry_count: u32,
    pub retry_backoff_ms: u64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            timeout_secs: 60,
            retry_count: 2,
            retry_backoff_ms: 1000,
        }
    }
}

impl From<&OptimizationConfig> for OptimizerOptions {
    fn from(config: &OptimizationConfig) -> Self {
        Self {
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            retry_count: config.retry_count,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }
}

/// Worker that rewrites and/or translates subtitles through a chat model
#[derive(Debug, Clone)]
pub struct SubtitleOptimizer {
    /// Fixed provider; when absent one is built from the task's endpoint
    provider: Option<Arc<dyn ChatProvider>>,
    options: OptimizerOptions,
}

/// Everything one batch request needs, shared across concurrent batches
struct BatchContext {
    provider: Arc<dyn ChatProvider>,
    model: String,
    system: String,
    kind: PromptKind,
    options: OptimizerOptions,
}

impl SubtitleOptimizer {
    /// Optimizer talking to the OpenAI-compatible endpoint in each task's config
    pub fn new(options: OptimizerOptions) -> Self {
        Self { provider: None, options }
    }

    pub fn with_provider(provider: Arc<dyn ChatProvider>, options: OptimizerOptions) -> Self {
        Self { provider: Some(provider), options }
    }

    fn provider_for(&self, config: &TaskConfig) -> Arc<dyn ChatProvider> {
        match &self.provider {
            Some(provider) => provider.clone(),
            None => Arc::new(OpenAI::new(
                config.api_key.clone(),
                config.base_url.clone(),
                self.options.timeout_secs,
            )),
        }
    }

    fn finish(mut task: Task) -> Task {
        // A pipeline task stays pending for the stage after optimization
        if task.kind == TaskKind::Standalone {
            task.status = TaskStatus::Completed;
        }
        task
    }
}

impl BatchContext {
    /// Send one batch, retrying with doubling backoff, and read the answer for
    /// each of the batch's cues
    async fn process(
        &self,
        batch: &[SubtitleEntry],
        cancel: &CancellationToken,
    ) -> Result<HashMap<CueId, CueAnswer>, WorkerError> {
        let request = ChatRequest {
            model: self.model.clone(),
            system: self.system.clone(),
            user: prompts::user_message(batch),
            temperature: self.options.temperature,
        };

        let mut attempt = 0;
        let reply = loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
                result = self.provider.complete(request.clone()) => result,
            };

            match result {
                Ok(reply) => break reply,
                Err(e) if attempt < self.options.retry_count => {
                    let backoff = backoff_ms(self.options.retry_backoff_ms, attempt);
                    warn!("Request failed (attempt {}), retrying in {}ms: {}", attempt + 1, backoff, e);
                    attempt += 1;
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_millis(backoff)) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        };

        let answers = prompts::extract_json_object(&reply)
            .ok_or_else(|| WorkerError::InvalidResponse(truncate(&reply, 200)))?;

        let mut parsed = HashMap::new();
        for entry in batch {
            let Some(answer) = answers
                .get(entry.id.as_str())
                .and_then(|value| prompts::parse_answer(self.kind, value))
            else {
                warn!("Model skipped cue {}", entry.id);
                continue;
            };
            parsed.insert(entry.id.clone(), answer);
        }

        for key in answers.keys() {
            if !batch.iter().any(|entry| entry.id.as_str() == key) {
                debug!("Ignoring unexpected key {} in model reply", key);
            }
        }

        Ok(parsed)
    }
}

/// Delay before retry number `attempt + 1`, doubling each time
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

#[async_trait]
impl SubtitleWorker for SubtitleOptimizer {
    async fn run(
        &self,
        task: Task,
        subtitles: Vec<SubtitleEntry>,
        events: WorkerEvents,
        cancel: CancellationToken,
    ) -> Result<Task, WorkerError> {
        let config = task.config.clone();
        let Some(kind) = PromptKind::from_flags(config.need_optimize, config.need_translate) else {
            info!("Nothing to do for task {}: optimization and translation are off", task.short_id());
            events.progress(100, "Nothing to do");
            return Ok(Self::finish(task));
        };

        if subtitles.is_empty() {
            events.progress(100, "No subtitles");
            return Ok(Self::finish(task));
        }

        let target_language = if kind.translates() {
            language_utils::resolve_language_name(&config.target_language)
                .map_err(|e| WorkerError::Failed(e.to_string()))?
        } else {
            String::new()
        };

        let context = Arc::new(BatchContext {
            provider: self.provider_for(&config),
            model: config.llm_model.clone(),
            system: prompts::system_prompt(kind, &target_language),
            kind,
            options: self.options.clone(),
        });

        let batch_size = config.batch_size.max(1);
        let concurrency = config.thread_num.max(1);
        let batches: Vec<Vec<SubtitleEntry>> = subtitles.chunks(batch_size).map(|c| c.to_vec()).collect();
        let total_batches = batches.len();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let processed = Arc::new(AtomicUsize::new(0));

        info!(
            "Processing {} cues in {} batches ({} concurrent) for task {}",
            subtitles.len(),
            total_batches,
            concurrency,
            task.short_id()
        );
        events.progress(0, format!("Processing {} subtitles", subtitles.len()));

        let results = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| {
                let context = context.clone();
                let semaphore = semaphore.clone();
                let processed = processed.clone();
                let events = events.clone();
                let cancel = cancel.clone();

                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| WorkerError::Failed(e.to_string()))?;
                    if cancel.is_cancelled() {
                        return Err(WorkerError::Cancelled);
                    }

                    let start_time = Instant::now();
                    let answers = context.process(&batch, &cancel).await;
                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;

                    match &answers {
                        Ok(answers) => {
                            debug!("Batch {} completed in {:?}", batch_index + 1, start_time.elapsed());
                            let updates: UpdateMap = answers
                                .iter()
                                .map(|(id, answer)| (id.clone(), answer.update_value()))
                                .collect();
                            events.partial_update(updates);
                            let percent = (current * 100 / total_batches) as u8;
                            events.progress(percent, format!("{}/{} batches", current, total_batches));
                        }
                        Err(WorkerError::Cancelled) => {}
                        Err(e) => error!("Batch {} failed: {}", batch_index + 1, e),
                    }

                    answers
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        if cancel.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        let mut merged: HashMap<CueId, CueAnswer> = HashMap::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(answers) => merged.extend(answers),
                Err(WorkerError::Cancelled) => return Err(WorkerError::Cancelled),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if !errors.is_empty() {
            return Err(WorkerError::Failed(format!(
                "{} of {} batches failed: {}",
                errors.len(),
                total_batches,
                errors.join("; ")
            )));
        }

        // Sources are only replaced by a combined rewrite; otherwise multi-line
        // originals stay intact
        let final_entries: Vec<SubtitleEntry> = subtitles
            .into_iter()
            .map(|mut entry| {
                if let Some(answer) = merged.remove(&entry.id) {
                    if let Some(optimized) = answer.optimized {
                        entry.original_text = optimized;
                    }
                    entry.secondary_text = answer.secondary;
                }
                entry
            })
            .collect();

        events.full_update(final_entries);
        events.progress(100, "Done");
        Ok(Self::finish(task))
    }
}
