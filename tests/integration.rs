use cardlens::{
    ai::{ImageEditService, MockImageEditClient},
    app::{App, RunOutcome},
    data_url,
    generation::{GenerationSession, GenerationState},
    models::{Mode, ModeSettings, DEFAULT_PROMPT},
    settings::SettingsStore,
    Error,
};
use std::fs;
use std::sync::Arc;

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02];
const REFERENCE_URL: &str = "data:image/png;base64,YYYY";

fn configured_settings() -> ModeSettings {
    ModeSettings {
        prompt: "Hold the card.".to_string(),
        reference_image: Some(REFERENCE_URL.to_string()),
    }
}

#[tokio::test]
async fn test_full_workflow_with_mocks() {
    let dir = tempfile::tempdir().unwrap();
    let subject_path = dir.path().join("photo.jpg");
    fs::write(&subject_path, JPEG_BYTES).unwrap();

    let generated = data_url::encode_bytes("image/png", &[9, 8, 7]);
    let mock = MockImageEditClient::new().with_image_response(generated.clone());
    let probe = mock.clone();

    let store = SettingsStore::new(dir.path().join("settings.json"));
    store.save(Mode::Rainbow, configured_settings());

    let app = App::with_services(
        Arc::new(mock),
        SettingsStore::new(dir.path().join("settings.json")),
        dir.path().join("output"),
    );

    let outcome = app.run(&subject_path, Mode::Rainbow).await.unwrap();
    let RunOutcome::Saved(path) = outcome else {
        panic!("expected Saved, got {:?}", outcome);
    };

    assert_eq!(probe.get_call_count(), 1);
    assert_eq!(
        fs::read(&path).unwrap(),
        data_url::decode(&generated).unwrap().bytes().unwrap()
    );
}

#[tokio::test]
async fn test_unconfigured_mode_fails_without_provider_call() {
    let dir = tempfile::tempdir().unwrap();
    let subject_path = dir.path().join("photo.jpg");
    fs::write(&subject_path, JPEG_BYTES).unwrap();

    let mock = MockImageEditClient::new();
    let probe = mock.clone();

    // No settings saved: the default mode has no reference image.
    let app = App::with_services(
        Arc::new(mock),
        SettingsStore::new(dir.path().join("settings.json")),
        dir.path().join("output"),
    );

    let outcome = app.run(&subject_path, Mode::Rainbow).await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Failed("A reference image must be set in settings.".to_string())
    );
    assert_eq!(probe.get_call_count(), 0);
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_user_message() {
    let dir = tempfile::tempdir().unwrap();
    let subject_path = dir.path().join("photo.jpg");
    fs::write(&subject_path, JPEG_BYTES).unwrap();

    let mock = MockImageEditClient::new().with_error_response(Error::HttpStatus {
        status: 401,
        body: "bad key".to_string(),
    });

    let store = SettingsStore::new(dir.path().join("settings.json"));
    store.save(Mode::Rainbow, configured_settings());

    let app = App::with_services(
        Arc::new(mock),
        store,
        dir.path().join("output"),
    );

    let outcome = app.run(&subject_path, Mode::Rainbow).await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Failed("The image service rejected the configured API key.".to_string())
    );
}

#[tokio::test]
async fn test_settings_survive_reload_and_keep_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store = SettingsStore::new(path.clone());
    assert_eq!(store.load().mode(Mode::Rainbow).prompt, DEFAULT_PROMPT);

    store.save(Mode::Rainbow, configured_settings());

    let reopened = SettingsStore::new(path);
    assert_eq!(reopened.load().mode(Mode::Rainbow), configured_settings());
}

#[tokio::test]
async fn test_session_is_reusable_across_attempts() {
    let mock = MockImageEditClient::new()
        .with_error_response(Error::NoImageReturned)
        .with_image_response("data:image/png;base64,QUFB".to_string());
    let session = GenerationSession::new(Arc::new(mock) as Arc<dyn ImageEditService>);

    let settings = configured_settings();

    let first = session
        .generate("data:image/jpeg;base64,AAAA", &settings)
        .await;
    assert_eq!(
        first,
        GenerationState::Failed {
            message: "Generation failed. Try again.".to_string()
        }
    );

    let second = session
        .generate("data:image/jpeg;base64,BBBB", &settings)
        .await;
    assert_eq!(
        second,
        GenerationState::Success {
            image: "data:image/png;base64,QUFB".to_string()
        }
    );
}
