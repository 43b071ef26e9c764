/// Text-completion capability
///
/// The analytics engine talks to language models through [`TextGenerator`],
/// a single `generate(prompt) -> text` call. Implementations report failure
/// honestly; deciding what to show the user instead is the caller's job
/// (see `analytics::summary`).
///
/// # Implementations
///
/// - [`gemini::GeminiClient`]: Google Generative Language API over HTTPS
/// - [`UnavailableGenerator`]: used when no API key is configured
/// - [`MockGenerator`]: scripted replies for tests and local runs

pub mod gemini;

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Text generation failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// No provider is configured
    #[error("Text generation is not configured")]
    Unavailable,

    /// Provider did not answer in time
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Transport-level failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Provider answered with a non-success status
    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    /// Provider answered but with nothing usable
    #[error("Empty or malformed completion: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    pub fn timeout(after: Duration) -> Self {
        GenerationError::Timeout(after.as_millis() as u64)
    }
}

/// Opaque text-completion service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Completes `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generator that always reports [`GenerationError::Unavailable`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGenerator;

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

#[derive(Debug, Clone)]
enum MockBehavior {
    Reply(String),
    Fail(GenerationError),
    Stall(Duration),
}

/// Scripted generator
///
/// Records every prompt it receives so tests can inspect what was sent.
///
/// # Example
///
/// ```
/// use smarttask_shared::ai::{MockGenerator, TextGenerator};
///
/// # async fn example() {
/// let mock = MockGenerator::replying("hello");
/// assert_eq!(mock.generate("hi").await.unwrap(), "hello");
/// assert_eq!(mock.prompts(), vec!["hi".to_string()]);
/// # }
/// ```
#[derive(Debug)]
pub struct MockGenerator {
    behavior: MockBehavior,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn with(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(MockBehavior::Reply(text.into()))
    }

    /// Fails every prompt with `error`
    pub fn failing(error: GenerationError) -> Self {
        Self::with(MockBehavior::Fail(error))
    }

    /// Sleeps for `delay` before answering with an empty string
    pub fn stalling(delay: Duration) -> Self {
        Self::with(MockBehavior::Stall(delay))
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(text.clone()),
            MockBehavior::Fail(err) => Err(err.clone()),
            MockBehavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(String::new())
            }
        }
    }
}
