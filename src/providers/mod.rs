/*!
 * Chat-completion providers used by the subtitle optimizer.
 *
 * - `openai`: any OpenAI-compatible `/chat/completions` endpoint
 * - `mock`: scripted offline provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single system + user exchange with an LLM
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Common trait for all LLM providers
///
/// This trait lets the optimizer run against a real endpoint or a mock.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    /// Complete a request and return the assistant text
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

pub mod mock;
pub mod openai;
