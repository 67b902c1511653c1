/*!
 * Tests for error types and conversions
 */

use subforge::errors::{AppError, ProviderError, SessionError, SubtitleError, TableError, WorkerError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_providerError_authenticationError_shouldDisplayCorrectly() {
    let error = ProviderError::AuthenticationError("Invalid API key".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Authentication error"));
    assert!(display.contains("Invalid API key"));
}

#[test]
fn test_subtitleError_timeFormat_shouldNameExpectedFormat() {
    let error = SubtitleError::TimeFormat("1:2:3".to_string());
    let display = error.to_string();
    assert!(display.contains("1:2:3"));
    assert!(display.contains("hh:mm:ss.zzz"));
}

#[test]
fn test_tableError_fromSubtitleError_shouldWrapAsEdit() {
    let error: TableError = SubtitleError::TimeFormat("x".to_string()).into();
    assert_eq!(error, TableError::Edit(SubtitleError::TimeFormat("x".to_string())));
}

#[test]
fn test_workerError_fromProviderError_shouldWrapCorrectly() {
    let error: WorkerError = ProviderError::ConnectionError("Network unreachable".to_string()).into();
    assert!(matches!(error, WorkerError::Provider(ProviderError::ConnectionError(_))));
    assert!(error.to_string().contains("Network unreachable"));
}

#[test]
fn test_workerError_failed_shouldDisplayMessageVerbatim() {
    let error = WorkerError::Failed("quota exhausted".to_string());
    assert_eq!(error.to_string(), "quota exhausted");
}

#[test]
fn test_appError_fromSessionError_shouldWrapCorrectly() {
    let error: AppError = SessionError::AlreadyRunning.into();
    assert!(matches!(error, AppError::Session(SessionError::AlreadyRunning)));
    assert!(error.to_string().contains("already in progress"));
}

#[test]
fn test_appError_fromIoError_shouldBecomeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: AppError = io.into();
    assert!(matches!(error, AppError::File(_)));
}
