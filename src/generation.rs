//! Generation lifecycle for one result view.
//!
//! A session moves `Idle -> Loading -> {Success, Failed}` per attempt.
//! Re-entering with new inputs before the prior attempt settles starts a new
//! attempt; the superseded attempt's resolution is observed and discarded so
//! a slow earlier response can never clobber a newer one. The attempt
//! counter and state share one mutex that is never held across an await.

use crate::ai::ImageEditService;
use crate::models::ModeSettings;
use crate::Error;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Idle,
    Loading,
    Success { image: String },
    Failed { message: String },
}

pub struct GenerationSession {
    service: Arc<dyn ImageEditService>,
    inner: Mutex<Inner>,
}

struct Inner {
    attempt: u64,
    state: GenerationState,
}

impl GenerationSession {
    pub fn new(service: Arc<dyn ImageEditService>) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner {
                attempt: 0,
                state: GenerationState::Idle,
            }),
        }
    }

    pub fn state(&self) -> GenerationState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Runs one generation attempt for the given inputs.
    ///
    /// A missing reference image or empty prompt fails locally without any
    /// provider call. Never returns an error: adapter failures become
    /// `Failed` with a user-facing message. Returns the session state as of
    /// this attempt's resolution.
    pub async fn generate(
        &self,
        subject_image: &str,
        settings: &ModeSettings,
    ) -> GenerationState {
        let (attempt, reference_image) = {
            let mut inner = self.inner.lock().unwrap();
            inner.attempt += 1;

            let Some(reference_image) = settings.reference_image.clone() else {
                let err =
                    Error::Configuration("A reference image must be set in settings.".to_string());
                inner.state = GenerationState::Failed {
                    message: err.user_message(),
                };
                return inner.state.clone();
            };

            if settings.prompt.trim().is_empty() {
                let err = Error::Configuration("A prompt must be set in settings.".to_string());
                inner.state = GenerationState::Failed {
                    message: err.user_message(),
                };
                return inner.state.clone();
            }

            inner.state = GenerationState::Loading;
            (inner.attempt, reference_image)
        };

        debug!("Starting generation attempt {}", attempt);
        let result = self
            .service
            .compose(subject_image, &reference_image, &settings.prompt)
            .await;

        let mut inner = self.inner.lock().unwrap();
        if inner.attempt != attempt {
            debug!(
                "Discarding result of superseded attempt {} (current: {})",
                attempt, inner.attempt
            );
            return inner.state.clone();
        }

        inner.state = match result {
            Ok(image) => {
                info!("Generation attempt {} succeeded", attempt);
                GenerationState::Success { image }
            }
            Err(e) => {
                warn!("Generation attempt {} failed: {}", attempt, e);
                GenerationState::Failed {
                    message: e.user_message(),
                }
            }
        };
        inner.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockImageEditClient;
    use crate::Result;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    const SUBJECT_A: &str = "data:image/jpeg;base64,AAAA";
    const SUBJECT_B: &str = "data:image/jpeg;base64,BBBB";
    const IMAGE_A: &str = "data:image/png;base64,QUFB";
    const IMAGE_B: &str = "data:image/png;base64,QkJC";

    fn settings_with_reference() -> ModeSettings {
        ModeSettings {
            prompt: "Hold the card.".to_string(),
            reference_image: Some("data:image/png;base64,YYYY".to_string()),
        }
    }

    /// Service whose calls block until the test releases them, one gate per
    /// expected call, so completion order can be forced.
    struct GatedEditService {
        gates: Mutex<VecDeque<oneshot::Receiver<Result<String>>>>,
        started: AtomicUsize,
    }

    impl GatedEditService {
        fn new(gates: Vec<oneshot::Receiver<Result<String>>>) -> Self {
            Self {
                gates: Mutex::new(gates.into()),
                started: AtomicUsize::new(0),
            }
        }

        async fn wait_for_calls(&self, count: usize) {
            while self.started.load(Ordering::SeqCst) < count {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl ImageEditService for GatedEditService {
        async fn compose(
            &self,
            _subject_image: &str,
            _reference_image: &str,
            _prompt: &str,
        ) -> Result<String> {
            let gate = self
                .gates
                .lock()
                .unwrap()
                .pop_front()
                .expect("one gate per expected call");
            self.started.fetch_add(1, Ordering::SeqCst);
            gate.await.expect("gate sender dropped")
        }
    }

    #[tokio::test]
    async fn test_missing_reference_fails_without_service_call() {
        let mock = MockImageEditClient::new();
        let probe = mock.clone();
        let session = GenerationSession::new(Arc::new(mock));

        let settings = ModeSettings {
            prompt: "Hold the card.".to_string(),
            reference_image: None,
        };

        let state = session.generate(SUBJECT_A, &settings).await;
        assert_eq!(
            state,
            GenerationState::Failed {
                message: "A reference image must be set in settings.".to_string()
            }
        );
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_without_service_call() {
        let mock = MockImageEditClient::new();
        let probe = mock.clone();
        let session = GenerationSession::new(Arc::new(mock));

        let settings = ModeSettings {
            prompt: "   ".to_string(),
            reference_image: Some("data:image/png;base64,YYYY".to_string()),
        };

        let state = session.generate(SUBJECT_A, &settings).await;
        assert!(matches!(state, GenerationState::Failed { .. }));
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_attempt_stores_image() {
        let mock = MockImageEditClient::new().with_image_response(IMAGE_A.to_string());
        let session = GenerationSession::new(Arc::new(mock));

        let state = session.generate(SUBJECT_A, &settings_with_reference()).await;
        assert_eq!(
            state,
            GenerationState::Success {
                image: IMAGE_A.to_string()
            }
        );
        assert_eq!(session.state(), state);
    }

    #[tokio::test]
    async fn test_adapter_failure_becomes_user_message() {
        let mock = MockImageEditClient::new().with_error_response(Error::HttpStatus {
            status: 429,
            body: "rate limited".to_string(),
        });
        let session = GenerationSession::new(Arc::new(mock));

        let state = session.generate(SUBJECT_A, &settings_with_reference()).await;
        assert_eq!(
            state,
            GenerationState::Failed {
                message: "The image service quota has been used up. Try again later.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_session_recovers_on_reentry() {
        let mock = MockImageEditClient::new()
            .with_error_response(Error::NoImageReturned)
            .with_image_response(IMAGE_A.to_string());
        let session = GenerationSession::new(Arc::new(mock));

        let settings = settings_with_reference();
        let first = session.generate(SUBJECT_A, &settings).await;
        assert!(matches!(first, GenerationState::Failed { .. }));

        let second = session.generate(SUBJECT_A, &settings).await;
        assert_eq!(
            second,
            GenerationState::Success {
                image: IMAGE_A.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let service = Arc::new(GatedEditService::new(vec![gate_a, gate_b]));
        let session = Arc::new(GenerationSession::new(
            service.clone() as Arc<dyn ImageEditService>
        ));

        let settings = settings_with_reference();

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            let settings = settings.clone();
            async move { session.generate(SUBJECT_A, &settings).await }
        });
        service.wait_for_calls(1).await;
        assert_eq!(session.state(), GenerationState::Loading);

        let second = tokio::spawn({
            let session = Arc::clone(&session);
            let settings = settings.clone();
            async move { session.generate(SUBJECT_B, &settings).await }
        });
        service.wait_for_calls(2).await;

        // B resolves first and must win.
        release_b.send(Ok(IMAGE_B.to_string())).unwrap();
        let state_b = second.await.unwrap();
        assert_eq!(
            state_b,
            GenerationState::Success {
                image: IMAGE_B.to_string()
            }
        );

        // A resolves afterwards; its result must be discarded.
        release_a.send(Ok(IMAGE_A.to_string())).unwrap();
        let state_after_a = first.await.unwrap();
        assert_eq!(
            state_after_a,
            GenerationState::Success {
                image: IMAGE_B.to_string()
            }
        );
        assert_eq!(
            session.state(),
            GenerationState::Success {
                image: IMAGE_B.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_overwrite_newer_success() {
        let (release_a, gate_a) = oneshot::channel();
        let (release_b, gate_b) = oneshot::channel();
        let service = Arc::new(GatedEditService::new(vec![gate_a, gate_b]));
        let session = Arc::new(GenerationSession::new(
            service.clone() as Arc<dyn ImageEditService>
        ));

        let settings = settings_with_reference();

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            let settings = settings.clone();
            async move { session.generate(SUBJECT_A, &settings).await }
        });
        service.wait_for_calls(1).await;

        let second = tokio::spawn({
            let session = Arc::clone(&session);
            let settings = settings.clone();
            async move { session.generate(SUBJECT_B, &settings).await }
        });
        service.wait_for_calls(2).await;

        release_b.send(Ok(IMAGE_B.to_string())).unwrap();
        second.await.unwrap();

        release_a
            .send(Err(Error::HttpStatus {
                status: 500,
                body: "late failure".to_string(),
            }))
            .unwrap();
        first.await.unwrap();

        assert_eq!(
            session.state(),
            GenerationState::Success {
                image: IMAGE_B.to_string()
            }
        );
    }
}
