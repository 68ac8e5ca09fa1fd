use crate::client::error_classification::{classify, ErrorInfo, Failure};
use crate::client::policy::{RetryDecision, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::client::validation::AudioValidator;
use crate::progress::{noop_sink, ProgressEvent, ProgressSink};
use crate::transport::AudioTransport;
use crate::types::{AnalysisResult, AudioPayload};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-run knobs for [`AnalysisClient::analyze`].
#[derive(Clone)]
pub struct AnalysisOptions {
    pub max_attempts: u32,
    pub auto_retry: bool,
    pub progress: Arc<dyn ProgressSink>,
}

impl AnalysisOptions {
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_auto_retry(mut self, enable: bool) -> Self {
        self.auto_retry = enable;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            auto_retry: true,
            progress: noop_sink(),
        }
    }
}

impl fmt::Debug for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisOptions")
            .field("max_attempts", &self.max_attempts)
            .field("auto_retry", &self.auto_retry)
            .finish_non_exhaustive()
    }
}

/// Analysis service client: validation, upload, classification and retries.
///
/// Build once with [`crate::AnalysisClientBuilder`] and share through `Arc`.
pub struct AnalysisClient {
    transport: Arc<dyn AudioTransport>,
    validator: AudioValidator,
    policy: RetryPolicy,
    timeout: Duration,
    auto_retry: bool,
}

impl AnalysisClient {
    pub(crate) fn new(
        transport: Arc<dyn AudioTransport>,
        validator: AudioValidator,
        policy: RetryPolicy,
        timeout: Duration,
        auto_retry: bool,
    ) -> Self {
        Self {
            transport,
            validator,
            policy,
            timeout,
            auto_retry,
        }
    }

    pub fn builder() -> crate::AnalysisClientBuilder {
        crate::AnalysisClientBuilder::new()
    }

    pub fn validator(&self) -> &AudioValidator {
        &self.validator
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Options seeded from the client's configuration, with a no-op progress sink.
    pub fn default_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            max_attempts: self.policy.max_attempts,
            auto_retry: self.auto_retry,
            progress: noop_sink(),
        }
    }

    /// Pre-flight check only; never touches the network.
    pub fn validate(&self, payload: &AudioPayload) -> Result<(), ErrorInfo> {
        self.validator
            .validate(payload)
            .map_err(|e| classify(&Failure::Validation(e)))
    }

    /// Analyze `payload`, retrying transient failures with capped exponential backoff.
    ///
    /// Every failure is returned as a classified [`ErrorInfo`]; raw transport
    /// errors never escape.
    pub async fn analyze(
        &self,
        payload: &AudioPayload,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult, ErrorInfo> {
        if let Err(info) = self.validate(payload) {
            debug!(
                bytes = payload.len(),
                media_type = payload.media_type(),
                reason = info.message.as_str(),
                "audio rejected before upload"
            );
            return Err(info);
        }

        let progress = options.progress.as_ref();
        report(progress, ProgressEvent::Preparing).await;

        let policy = self.policy.clone().with_max_attempts(options.max_attempts);
        let max_attempts = policy.attempts();
        let mut attempt = 1u32;

        loop {
            report(progress, ProgressEvent::Uploading { attempt }).await;
            info!(attempt, max_attempts, bytes = payload.len(), "analysis attempt started");

            let failure = match self.attempt_once(payload, progress).await {
                Ok(result) => {
                    info!(attempt, decision = ?result.decision, "analysis complete");
                    report(progress, ProgressEvent::Complete).await;
                    return Ok(result);
                }
                Err(failure) => failure,
            };

            let info = classify(&failure);
            info.log(&format!("analysis attempt {}", attempt));

            match policy.decide(&info, attempt, options.auto_retry) {
                RetryDecision::Fail => return Err(info),
                RetryDecision::Retry { delay } => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        kind = %info.kind,
                        "retrying analysis"
                    );
                    report(
                        progress,
                        ProgressEvent::Retrying {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                            error: info,
                        },
                    )
                    .await;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt_once(
        &self,
        payload: &AudioPayload,
        progress: &dyn ProgressSink,
    ) -> Result<AnalysisResult, Failure> {
        let raw = self.transport.send(payload, self.timeout).await?;
        report(progress, ProgressEvent::Processing).await;
        Ok(AnalysisResult::from_json(&raw.body)?)
    }
}

// Progress is observational only.
async fn report(sink: &dyn ProgressSink, event: ProgressEvent) {
    if let Err(e) = sink.report(event).await {
        debug!(error = %e, "progress sink rejected event");
    }
}
