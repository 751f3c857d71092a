pub mod error;
pub mod gemini;

#[derive(Debug, Clone, Copy)]
pub enum Provider {
    Gemini,
}

/// Free-text question answering. The bot treats the provider opaquely:
/// send a prompt, receive text.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn ask(&self, question: &str) -> anyhow::Result<String>;
}
