/*!
 * Optimization session module.
 *
 * This module provides:
 * - Tasks and their configuration snapshots
 * - The typed worker event stream
 * - The session state machine relaying worker events into the table model
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::OptimizationSession;
pub use models::{
    SessionNotice, SessionState, Task, TaskConfig, TaskKind, TaskStatus, UpdateMap, WorkerEvent,
};
