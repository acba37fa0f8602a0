//! External generation services.
//!
//! The studio never talks to a model directly. Front ends plug in
//! implementations of these traits; tests use in-process fakes.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service answered with an error.
    #[error("upstream request failed: {0}")]
    Request(String),

    /// The service could not be reached. Worth retrying.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Turns post text into image prompts.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    /// Describe one image for the whole post. May return an empty string.
    async fn generate(&self, post: &str) -> Result<String, UpstreamError>;

    /// Split the post into `parts` sections, one per image of a series.
    async fn partition(&self, post: &str, parts: usize) -> Result<Vec<String>, UpstreamError>;
}

/// Produces image bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt`, using `references` as style guidance.
    async fn generate(
        &self,
        prompt: &str,
        references: &[Vec<u8>],
    ) -> Result<Vec<u8>, UpstreamError>;

    /// Apply `instructions` to an existing image.
    async fn edit(&self, instructions: &str, image: &[u8]) -> Result<Vec<u8>, UpstreamError>;
}
