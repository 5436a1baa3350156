// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Prompting, retry policy and persistence live in the generation domain and use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseVisionAI, BaseImageStore)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Vision AI Trait (Infrastructure - completion with an optional image)
// =============================================================================

/// One completion call: instructions, user prompt and at most one image.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionRequest {
    pub system: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the model for a JSON object instead of free text
    pub json: bool,
}

impl VisionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            image_url: None,
            max_tokens: 1200,
            temperature: 0.6,
            json: true,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Same request with the image input dropped
    pub fn without_image(&self) -> Self {
        Self {
            image_url: None,
            ..self.clone()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

#[async_trait]
pub trait BaseVisionAI: Send + Sync {
    /// Complete a request, returning the raw text of the model's reply
    async fn complete(&self, request: &VisionRequest) -> Result<String>;
}

// =============================================================================
// Image Store Trait (Infrastructure - hosted object storage)
// =============================================================================

#[async_trait]
pub trait BaseImageStore: Send + Sync {
    /// Upload bytes under `path` and return the public URL
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}
