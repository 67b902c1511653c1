/*!
 * Mock provider implementations for testing.
 *
 * - `MockProvider::echo()` - answers with the request's JSON payload, each value
 *   passed through a transform
 * - `MockProvider::failing()` - always fails with an error
 * - `MockProvider::scripted(..)` - replays fixed responses in order
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use super::{ChatProvider, ChatRequest};

/// Behavior mode for the mock provider
#[derive(Debug)]
pub enum MockBehavior {
    /// Parse the JSON object in the user prompt and map every value
    Echo { transform: fn(&str) -> String },
    /// Always fails with an error
    Failing,
    /// Fail the first N requests, then echo unchanged
    FailFirst(usize),
    /// Pop responses in order, failing once exhausted
    Scripted(Mutex<VecDeque<String>>),
}

/// Mock provider for testing optimizer behavior
#[derive(Debug)]
pub struct MockProvider {
    behavior: MockBehavior,
    request_count: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Echo every value with a marker prefix
    pub fn echo() -> Self {
        Self::with_transform(|text| format!("[OK] {}", text))
    }

    pub fn with_transform(transform: fn(&str) -> String) -> Self {
        Self::new(MockBehavior::Echo { transform })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_first(count: usize) -> Self {
        Self::new(MockBehavior::FailFirst(count))
    }

    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockBehavior::Scripted(Mutex::new(responses.into_iter().map(Into::into).collect())))
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    fn echo_payload(user: &str, transform: fn(&str) -> String) -> Result<String, ProviderError> {
        let start = user.find('{').ok_or_else(|| ProviderError::ParseError("no payload".to_string()))?;
        let end = user.rfind('}').ok_or_else(|| ProviderError::ParseError("no payload".to_string()))?;
        let payload: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&user[start..=end])
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let mapped: serde_json::Map<String, serde_json::Value> = payload
            .into_iter()
            .map(|(k, v)| {
                let text = v.as_str().unwrap_or_default().to_string();
                (k, serde_json::Value::String(transform(&text)))
            })
            .collect();
        serde_json::to_string(&mapped).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match &self.behavior {
            MockBehavior::Echo { transform } => Self::echo_payload(&request.user, *transform),
            MockBehavior::Failing => Err(ProviderError::ConnectionError("mock provider is down".to_string())),
            MockBehavior::FailFirst(n) if count < *n => {
                Err(ProviderError::ApiError { status_code: 503, message: "try again".to_string() })
            }
            MockBehavior::FailFirst(_) => Self::echo_payload(&request.user, |t| t.to_string()),
            MockBehavior::Scripted(responses) => responses
                .lock()
                .pop_front()
                .ok_or_else(|| ProviderError::RequestFailed("no scripted response left".to_string())),
        }
    }
}
