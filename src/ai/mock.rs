use super::ImageEditService;
use crate::{data_url, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scriptable [`ImageEditService`] for orchestrator and app tests.
///
/// Queued responses are consumed in order; once the queue is empty every
/// call yields a small PNG data URL. Clones share the queue and call count,
/// so a clone can be kept as a probe after handing the mock to the app.
pub struct MockImageEditClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageEditClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_response(self, image: String) -> Self {
        self.responses.lock().unwrap().push_back(Ok(image));
        self
    }

    pub fn with_error_response(self, error: crate::Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockImageEditClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockImageEditClient {
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            call_count: Arc::clone(&self.call_count),
        }
    }
}

#[async_trait]
impl ImageEditService for MockImageEditClient {
    async fn compose(
        &self,
        _subject_image: &str,
        _reference_image: &str,
        _prompt: &str,
    ) -> Result<String> {
        *self.call_count.lock().unwrap() += 1;

        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(data_url::encode_bytes(
                "image/png",
                &[0x89, 0x50, 0x4E, 0x47],
            )),
        }
    }
}
