use whisper_relay::presentation::config::{
    StorageProviderSetting, TranscriptionProviderSetting,
};
use whisper_relay::presentation::{Environment, Settings};

fn defaults() -> Settings {
    Settings::builder(Environment::Test)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[test]
fn given_no_overrides_when_loading_then_server_listens_on_port_8000() {
    let settings = defaults();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
}

#[test]
fn given_no_overrides_when_loading_then_messaging_uses_standard_topics() {
    let settings = defaults();

    assert!(settings.messaging.enabled);
    assert_eq!(settings.messaging.inbound_topic, "send-data");
    assert_eq!(settings.messaging.outbound_topic, "recognition");
    assert_eq!(settings.messaging.group_id, "whisper-transcriber");
}

#[test]
fn given_no_overrides_when_loading_then_transcription_defaults_to_local_medium() {
    let settings = defaults();

    assert_eq!(
        settings.transcription.provider,
        TranscriptionProviderSetting::Local
    );
    assert_eq!(settings.transcription.default_model, "medium");
    assert_eq!(settings.transcription.scratch_dir(), std::env::temp_dir());
}

#[test]
fn given_no_overrides_when_loading_then_shutdown_is_bounded_to_ten_seconds() {
    let settings = defaults();

    assert_eq!(settings.worker.shutdown_timeout_secs, 10);
    assert_eq!(settings.worker.receive_backoff_ms, 1000);
}

#[test]
fn given_no_overrides_when_loading_then_storage_is_s3_with_tls() {
    let settings = defaults();

    assert_eq!(settings.storage.provider, StorageProviderSetting::S3);
    assert!(settings.storage.use_ssl);
    assert!(settings.storage.endpoint.is_none());
    assert_eq!(settings.storage.max_retries, 3);
}

#[test]
fn given_override_when_loading_then_replaces_default() {
    let settings: Settings = Settings::builder(Environment::Test)
        .unwrap()
        .set_override("transcription.provider", "openai")
        .unwrap()
        .set_override("worker.shutdown_timeout_secs", 3)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

    assert_eq!(
        settings.transcription.provider,
        TranscriptionProviderSetting::OpenAi
    );
    assert_eq!(settings.worker.shutdown_timeout_secs, 3);
}
