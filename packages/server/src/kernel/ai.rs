//! Vision completions backed by the OpenAI chat API.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use openai_client::{ChatRequest, Message, OpenAIClient};
use regex::Regex;
use tracing::{debug, warn};

use super::{BaseVisionAI, VisionRequest};

lazy_static! {
    // Errors that mean the provider could not load the image we pointed it at.
    static ref IMAGE_FETCH_ERROR: Regex = Regex::new(
        r"(?i)\b(image|images|image_url|invalid_image|download(?:ing)?|fetch(?:ing)?|url)\b|timeout while"
    )
    .unwrap();
}

/// Completion client for vision-capable chat models
pub struct OpenAIVision {
    client: Arc<OpenAIClient>,
    model: String,
}

impl OpenAIVision {
    pub fn new(client: Arc<OpenAIClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseVisionAI for OpenAIVision {
    async fn complete(&self, request: &VisionRequest) -> Result<String> {
        let user = match &request.image_url {
            Some(url) => Message::user_with_image(request.prompt.clone(), url.clone()),
            None => Message::user(request.prompt.clone()),
        };

        let mut chat = ChatRequest::new(self.model.clone())
            .message(Message::system(request.system.clone()))
            .message(user)
            .temperature(request.temperature)
            .token_limit(request.max_tokens);
        if request.json {
            chat = chat.json_mode();
        }

        debug!(
            model = %self.model,
            has_image = request.has_image(),
            "Requesting completion"
        );

        let response = self
            .client
            .chat_completion(chat)
            .await
            .context("Completion request failed")?;

        if let Some(usage) = &response.usage {
            debug!(total_tokens = usage.total_tokens, "Completion finished");
        }

        Ok(response.content)
    }
}

/// True when an error message reads like the provider failed to load the image.
pub fn is_image_fetch_error(message: &str) -> bool {
    IMAGE_FETCH_ERROR.is_match(message)
}

/// Run a completion, retrying exactly once without the image when the first
/// attempt failed because the image could not be fetched.
///
/// Any other error, or a failure of the retry itself, is returned.
pub async fn complete_with_image_retry(
    ai: &dyn BaseVisionAI,
    request: &VisionRequest,
) -> Result<String> {
    match ai.complete(request).await {
        Ok(text) => Ok(text),
        Err(e) => {
            let message = format!("{:#}", e);
            if request.has_image() && is_image_fetch_error(&message) {
                warn!(error = %message, "Image input failed, retrying without image");
                ai.complete(&request.without_image())
                    .await
                    .context("Completion failed after dropping image input")
            } else {
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockVisionAI;

    #[test]
    fn test_image_error_detection() {
        assert!(is_image_fetch_error(
            "API error (400): Error while downloading https://cdn.example.com/a.jpg"
        ));
        assert!(is_image_fetch_error("invalid_image: unsupported format"));
        assert!(is_image_fetch_error("Timeout while fetching the file"));
        assert!(is_image_fetch_error("Could not process image_url"));
        assert!(!is_image_fetch_error("API error (429): rate limit exceeded"));
        assert!(!is_image_fetch_error("API error (401): invalid api key"));
    }

    #[tokio::test]
    async fn test_retries_once_without_image() {
        let ai = MockVisionAI::new()
            .with_error("API error (400): Failed to download image")
            .with_response("{\"title\":\"Deck\",\"body\":\"Done.\"}");
        let request = VisionRequest::new("sys", "prompt").with_image("https://x/a.jpg");

        let text = complete_with_image_retry(&ai, &request).await.unwrap();
        assert!(text.contains("Deck"));

        let calls = ai.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].image_url.is_some());
        assert!(calls[1].image_url.is_none());
    }

    #[tokio::test]
    async fn test_does_not_retry_unrelated_errors() {
        let ai = MockVisionAI::new().with_error("API error (429): rate limit exceeded");
        let request = VisionRequest::new("sys", "prompt").with_image("https://x/a.jpg");

        assert!(complete_with_image_retry(&ai, &request).await.is_err());
        assert_eq!(ai.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_second_failure_surfaces() {
        let ai = MockVisionAI::new()
            .with_error("invalid_image")
            .with_error("invalid_image again");
        let request = VisionRequest::new("sys", "prompt").with_image("https://x/a.jpg");

        assert!(complete_with_image_retry(&ai, &request).await.is_err());
        assert_eq!(ai.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_without_image() {
        let ai = MockVisionAI::new().with_error("image download failed");
        let request = VisionRequest::new("sys", "prompt");

        assert!(complete_with_image_retry(&ai, &request).await.is_err());
        assert_eq!(ai.calls().len(), 1);
    }
}
