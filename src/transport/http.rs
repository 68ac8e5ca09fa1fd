use super::{AudioTransport, RawResponse, TransportError};
use crate::types::AudioPayload;
use crate::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Proxy};
use std::env;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Multipart field carrying the audio.
pub const FILE_FIELD: &str = "file";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// reqwest-backed transport posting multipart uploads to one endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("VOICEGUARD_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(8),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("VOICEGUARD_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(payload: &AudioPayload) -> std::result::Result<Form, TransportError> {
        // shares the payload's buffer; no copy per attempt
        let body = Body::from(payload.data().clone());
        let part = Part::stream_with_length(body, payload.len() as u64)
            .file_name(payload.file_name().to_string())
            .mime_str(payload.effective_media_type())
            .map_err(|e| TransportError::Other(format!("Invalid mime: {}", e)))?;
        Ok(Form::new().part(FILE_FIELD, part))
    }

    async fn send_once(
        &self,
        payload: &AudioPayload,
        request_id: &str,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(REQUEST_ID_HEADER, request_id)
            .multipart(Self::form(payload)?);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(
            endpoint = self.endpoint.as_str(),
            request_id,
            http_status = status.as_u16(),
            body_len = body.len(),
            "analysis response received"
        );

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let body = serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(RawResponse {
            status: status.as_u16(),
            body,
            request_id: Some(request_id.to_string()),
        })
    }
}

#[async_trait]
impl AudioTransport for HttpTransport {
    async fn send(
        &self,
        payload: &AudioPayload,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            endpoint = self.endpoint.as_str(),
            request_id = request_id.as_str(),
            bytes = payload.len(),
            media_type = payload.effective_media_type(),
            "uploading audio"
        );

        // Dropping the future on expiry cancels the in-flight request.
        match tokio::time::timeout(timeout, self.send_once(payload, &request_id)).await {
            Ok(Err(TransportError::Timeout { .. })) | Err(_) => {
                Err(TransportError::Timeout { after: timeout })
            }
            Ok(result) => result,
        }
    }
}
