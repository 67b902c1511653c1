/*!
 * Common test utilities for the subforge test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use subforge::subtitle_processor::SubtitleEntry;

// Re-export the scripted workers module
pub mod mock_workers;

/// Route library logs through env_logger (filtered by RUST_LOG) once per test binary
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Three-cue SRT sample
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
";

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Entries with ids "1".."count", one second apart
pub fn sample_entries(count: usize) -> Vec<SubtitleEntry> {
    (1..=count)
        .map(|i| {
            let start = i as u64 * 1000;
            SubtitleEntry::new(i, start, start + 800, format!("line {}", i), "")
        })
        .collect()
}
