//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use voiceguard_client::{
    AnalysisClient, AnalysisClientBuilder, AudioPayload, AudioTransport, RawResponse,
    TransportError,
};

type Responder = Box<dyn Fn(usize) -> Result<Value, TransportError> + Send + Sync>;

/// In-process transport answering from a closure keyed by call index (0-based).
pub struct ScriptedTransport {
    respond: Responder,
    calls: AtomicUsize,
    started: Mutex<Vec<Instant>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(usize) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every call waits for one `notify_one()` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Gaps between consecutive call start times.
    pub fn gaps(&self) -> Vec<Duration> {
        let started = self.started.lock().unwrap();
        started.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl AudioTransport for ScriptedTransport {
    async fn send(
        &self,
        _payload: &AudioPayload,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.respond)(call).map(|body| RawResponse {
            status: 200,
            body,
            request_id: None,
        })
    }
}

pub fn http_error(status: u16) -> TransportError {
    TransportError::Http {
        status,
        status_text: String::new(),
        body: String::new(),
    }
}

pub fn authentic_body() -> Value {
    json!({
        "decision": "AUTHENTIC",
        "scores": {"authenticity_score": 0.91, "trust_index": 0.88, "confidence": 0.95},
        "provenance": {"human_probability": 0.91, "synthetic_probability": 0.09},
        "signals": {
            "aasist": {"confidence": 0.9, "weight": 0.4},
            "hfi": {"confidence": 0.87, "weight": 0.35},
            "tns": {"confidence": 0.85, "weight": 0.25}
        },
        "explanation": "Natural prosody and breath noise."
    })
}

/// 8 KiB of WAV-typed bytes; passes the default pre-flight checks.
pub fn wav_clip() -> AudioPayload {
    AudioPayload::from_file("clip.wav", vec![0u8; 8 * 1024], "audio/wav")
}

pub fn client_with(transport: Arc<ScriptedTransport>) -> AnalysisClient {
    AnalysisClientBuilder::new()
        .transport(transport)
        .build()
        .expect("client builds with an injected transport")
}
