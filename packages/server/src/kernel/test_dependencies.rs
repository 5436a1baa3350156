// Mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{BaseImageStore, BaseVisionAI, VisionRequest};

// =============================================================================
// Mock Vision AI
// =============================================================================

/// Default reply when no scripted responses remain
pub const MOCK_COMPLETION: &str = r#"{"title":"Backyard Deck Rebuild","excerpt":"We replaced a weathered deck with new composite boards.","body":"We replaced a weathered deck with new composite boards and a fresh railing."}"#;

/// Scripted completion client.
///
/// Responses are consumed in order; once exhausted every call returns
/// [`MOCK_COMPLETION`].
#[derive(Clone)]
pub struct MockVisionAI {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    calls: Arc<Mutex<Vec<VisionRequest>>>,
}

impl MockVisionAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, text: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(text.to_string()));
        self
    }

    pub fn with_error(self, message: &str) -> Self {
        self.responses.lock().unwrap().push(Err(message.to_string()));
        self
    }

    /// All requests received, in order
    pub fn calls(&self) -> Vec<VisionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockVisionAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseVisionAI for MockVisionAI {
    async fn complete(&self, request: &VisionRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());

        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(MOCK_COMPLETION.to_string()),
        }
    }
}

// =============================================================================
// Mock Image Store
// =============================================================================

/// Arguments captured from an upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Clone)]
pub struct MockImageStore {
    uploads: Arc<Mutex<Vec<UploadCall>>>,
    fail_with: Option<String>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// Every upload fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseImageStore for MockImageStore {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        self.uploads.lock().unwrap().push(UploadCall {
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });

        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }

        Ok(format!("https://images.test/{}", path))
    }
}
