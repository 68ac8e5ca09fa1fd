//! Loading clips and configuration from disk.

use std::io::Write;
use voiceguard_client::{AnalysisClientBuilder, AudioPayload, ClientConfig, Error};

#[test]
fn test_payload_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voice-note.ogg");
    std::fs::write(&path, vec![7u8; 2048]).unwrap();

    let clip = AudioPayload::from_path(&path).unwrap();
    assert_eq!(clip.file_name(), "voice-note.ogg");
    assert_eq!(clip.media_type(), "audio/ogg");
    assert_eq!(clip.len(), 2048);
}

#[test]
fn test_unknown_extension_falls_back_to_webm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.bin");
    std::fs::write(&path, vec![7u8; 2048]).unwrap();

    let clip = AudioPayload::from_path(&path).unwrap();
    assert_eq!(clip.media_type(), "");
    assert_eq!(clip.effective_media_type(), "audio/webm");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AudioPayload::from_path(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{:?}", err);
}

#[test]
fn test_yaml_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "base_url: http://analysis.internal:8080\ntimeout_ms: 12000\nmax_attempts: 2\nauto_retry: false\nmax_payload_bytes: 2048"
    )
    .unwrap();

    let config = ClientConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.timeout_ms, 12000);
    assert!(!config.auto_retry);
    assert_eq!(
        config.endpoint().unwrap(),
        "http://analysis.internal:8080/v1/voice/analyze"
    );

    let client = AnalysisClientBuilder::from_config(config).build().unwrap();
    assert_eq!(client.policy().max_attempts, 2);
    assert_eq!(client.validator().config().max_bytes, 2048);
    assert!(!client.default_options().auto_retry);

    let too_big = AudioPayload::from_file("big.wav", vec![0u8; 4096], "audio/wav");
    assert!(client.validate(&too_big).is_err());
}

#[test]
fn test_invalid_limits_are_rejected() {
    let err = AnalysisClientBuilder::new()
        .payload_limits(4096, 1024)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, Error::Configuration { .. }), "{:?}", err);
}
