/*!
 * # subforge - subtitle optimization with LLMs
 *
 * A Rust library for loading, editing and saving subtitle files while a
 * background worker cleans up or translates them.
 *
 * ## Features
 *
 * - Read SRT, WebVTT (including YouTube word-timed captions), ASS and JSON
 * - Write SRT, WebVTT, ASS, JSON and plain text
 * - Editable 4-column table projection with change notifications
 * - Background optimization sessions streaming partial and full updates
 * - OpenAI-compatible chat endpoints for cleanup and translation
 * - ISO 639 language code and name resolution
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: cues and the ordered subtitle collection
 * - `table_model`: the table projection over a collection
 * - `session`: tasks, worker events and the optimization session state machine
 * - `translation`: the worker trait and the LLM-backed optimizer:
 *   - `translation::optimizer`: batched, concurrent optimization/translation
 *   - `translation::prompts`: prompt templates and reply parsing
 * - `formats`: subtitle readers and writers
 * - `providers`: chat-completion clients:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: offline provider for tests
 * - `app_controller`: headless panel tying model, session and files together
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod language_utils;
pub mod providers;
pub mod session;
pub mod subtitle_processor;
pub mod table_model;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, SessionError, SubtitleError, TableError, WorkerError};
pub use formats::SubtitleFormat;
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use session::{OptimizationSession, SessionNotice, SessionState, Task, TaskStatus, WorkerEvent};
pub use subtitle_processor::{CueId, SubtitleCollection, SubtitleEntry};
pub use table_model::SubtitleTableModel;
pub use translation::{SubtitleOptimizer, SubtitleWorker};
