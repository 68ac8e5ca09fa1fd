//! Retry orchestration against an in-process transport.
//!
//! The tokio clock is paused, so backoff sleeps complete instantly while
//! `tokio::time::Instant` still observes the scheduled delays.

mod common;

use common::{authentic_body, client_with, http_error, wav_clip, ScriptedTransport};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use voiceguard_client::progress::InMemoryProgressSink;
use voiceguard_client::{
    AudioPayload, Decision, ErrorKind, ProgressEvent, TransportError,
};

fn assert_gap(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(50),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_server_errors() {
    let transport = Arc::new(ScriptedTransport::new(|call| match call {
        0 | 1 => Err(http_error(500)),
        _ => Ok(authentic_body()),
    }));
    let client = client_with(transport.clone());
    let sink = Arc::new(InMemoryProgressSink::default());
    let options = client.default_options().with_progress(sink.clone());

    let result = client.analyze(&wav_clip(), &options).await.unwrap();

    assert_eq!(result.decision, Decision::Authentic);
    assert_eq!(transport.calls(), 3);
    assert_eq!(sink.retry_count(), 2);

    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 2);
    assert_gap(gaps[0], 1000);
    assert_gap(gaps[1], 2000);

    assert_eq!(
        sink.stages(),
        vec![
            "preparing",
            "uploading",
            "retrying",
            "uploading",
            "retrying",
            "uploading",
            "processing",
            "complete",
        ]
    );

    let retries: Vec<_> = sink
        .get_events()
        .into_iter()
        .filter_map(|e| match e {
            ProgressEvent::Retrying {
                attempt,
                delay_ms,
                error,
            } => Some((attempt, delay_ms, error.kind)),
            _ => None,
        })
        .collect();
    assert_eq!(
        retries,
        vec![(2, 1000, ErrorKind::Processing), (3, 2000, ErrorKind::Processing)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_bad_request_is_terminal() {
    let transport = Arc::new(ScriptedTransport::new(|_| Err(http_error(400))));
    let client = client_with(transport.clone());
    let sink = Arc::new(InMemoryProgressSink::default());
    let options = client.default_options().with_progress(sink.clone());

    let err = client.analyze(&wav_clip(), &options).await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.status, Some(400));
    assert!(!err.retryable);
    assert_eq!(
        err.user_message,
        "Invalid audio file format. Please use MP3 or WAV files."
    );
    assert_eq!(sink.retry_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_incomplete_response_is_retryable() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        let mut body = authentic_body();
        body.as_object_mut().unwrap().remove("provenance");
        Ok(body)
    }));
    let client = client_with(transport.clone());

    let err = client
        .analyze(&wav_clip(), &client.default_options())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Response);
    assert!(err.retryable);
    assert!(err.message.contains("provenance"));
    assert_eq!(
        err.user_message,
        "Analysis response is incomplete. Please retry the analysis."
    );
    // default budget: four attempts
    assert_eq!(transport.calls(), 4);
    let gaps = transport.gaps();
    assert_gap(gaps[0], 1000);
    assert_gap(gaps[1], 2000);
    assert_gap(gaps[2], 4000);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_payload_never_reaches_transport() {
    let transport = Arc::new(ScriptedTransport::new(|_| Ok(authentic_body())));
    let client = client_with(transport.clone());
    let sink = Arc::new(InMemoryProgressSink::default());
    let options = client.default_options().with_progress(sink.clone());

    let tiny = AudioPayload::from_file("tiny.wav", vec![0u8; 10], "audio/wav");
    let err = client.analyze(&tiny, &options).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(!err.should_log);
    assert_eq!(err.user_message, "Audio file appears to be empty or too small.");

    let video = AudioPayload::from_file("clip.mp4", vec![0u8; 4096], "video/mp4");
    let err = client.analyze(&video, &options).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation));

    let oversized =
        AudioPayload::from_file("long.wav", vec![0u8; 10 * 1024 * 1024 + 1], "audio/wav");
    let err = client.analyze(&oversized, &options).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(!err.retryable);
    assert_eq!(err.user_message, "Audio file is too large. Maximum size is 10 MB.");

    let empty = AudioPayload::from_file("empty.wav", Vec::new(), "audio/wav");
    let err = client.analyze(&empty, &options).await.unwrap_err();
    assert_eq!(err.user_message, "No audio data provided.");

    assert_eq!(transport.calls(), 0);
    assert!(sink.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_codec_parameter_is_accepted() {
    let transport = Arc::new(ScriptedTransport::new(|_| Ok(authentic_body())));
    let client = client_with(transport.clone());

    let clip = AudioPayload::recording(vec![1u8; 4096], "audio/webm;codecs=opus");
    assert!(clip.file_name().starts_with("recording-"));
    assert!(clip.file_name().ends_with(".webm"));

    client
        .analyze(&clip, &client.default_options())
        .await
        .unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_auto_retry_disabled() {
    let transport = Arc::new(ScriptedTransport::new(|_| Err(http_error(503))));
    let client = client_with(transport.clone());
    let options = client.default_options().with_auto_retry(false);

    let err = client.analyze(&wav_clip(), &options).await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert!(err.retryable);
    assert!(err
        .format_user_message()
        .ends_with("You can try again or contact support if the problem persists."));
}

#[tokio::test(start_paused = true)]
async fn test_attempt_budget_is_exhausted() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Err(TransportError::Connect("connection refused".into()))
    }));
    let client = client_with(transport.clone());
    let sink = Arc::new(InMemoryProgressSink::default());
    let options = client
        .default_options()
        .with_max_attempts(3)
        .with_progress(sink.clone());

    let err = client.analyze(&wav_clip(), &options).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(transport.calls(), 3);
    assert_eq!(sink.retry_count(), 2);
    assert_eq!(sink.stages().last(), Some(&"uploading"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_still_tries_once() {
    let transport = Arc::new(ScriptedTransport::new(|_| Err(http_error(502))));
    let client = client_with(transport.clone());
    let options = client.default_options().with_max_attempts(0);

    client.analyze(&wav_clip(), &options).await.unwrap_err();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried() {
    let transport = Arc::new(ScriptedTransport::new(|call| {
        if call == 0 {
            Err(TransportError::Timeout {
                after: Duration::from_secs(30),
            })
        } else {
            Ok(authentic_body())
        }
    }));
    let client = client_with(transport.clone());

    let result = client
        .analyze(&wav_clip(), &client.default_options())
        .await
        .unwrap();
    assert!(!result.decision.is_synthetic());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_legacy_technical_details_response() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Ok(json!({
            "decision": "SYNTHETIC",
            "scores": {"authenticity_score": 0.12, "confidence": 0.9},
            "provenance": {"human_probability": 0.14, "synthetic_probability": 0.86},
            "technicalDetails": {
                "aasist": ["AASIST confidence: 92%", "Spectral analysis weight: 40%"],
                "prosody": ["Flat pitch contour"]
            },
            "explanation": "Vocoder artifacts in the high band."
        }))
    }));
    let client = client_with(transport);

    let result = client
        .analyze(&wav_clip(), &client.default_options())
        .await
        .unwrap();
    assert_eq!(result.decision, Decision::Spoof);
    let aasist = &result.signals["aasist"];
    assert!((aasist.confidence - 0.92).abs() < 1e-9);
    assert!((aasist.weight - 0.40).abs() < 1e-9);
    assert_eq!(result.signals["prosody"].confidence, 0.0);
}
