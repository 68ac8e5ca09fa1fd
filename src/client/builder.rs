use crate::client::config::ClientConfig;
use crate::client::core::AnalysisClient;
use crate::client::policy::RetryPolicy;
use crate::client::validation::AudioValidator;
use crate::transport::{AudioTransport, HttpTransport};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`AnalysisClient`].
///
/// Keep this surface area small and predictable. Everything not set explicitly
/// comes from [`ClientConfig`].
pub struct AnalysisClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn AudioTransport>>,
    base_delay: Option<Duration>,
    max_delay: Option<Duration>,
}

impl AnalysisClientBuilder {
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            base_delay: None,
            max_delay: None,
        }
    }

    /// Start from defaults overridden by `VOICEGUARD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(ClientConfig::from_env()?))
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn analyze_path(mut self, path: impl Into<String>) -> Self {
        self.config.analyze_path = path.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Default attempt budget for [`AnalysisClient::default_options`].
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn auto_retry(mut self, enable: bool) -> Self {
        self.config.auto_retry = enable;
        self
    }

    pub fn payload_limits(mut self, min_bytes: usize, max_bytes: usize) -> Self {
        self.config.min_payload_bytes = min_bytes;
        self.config.max_payload_bytes = max_bytes;
        self
    }

    /// Override the backoff schedule (base doubles per retry, capped at `max`).
    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = Some(base);
        self.max_delay = Some(max);
        self
    }

    /// Inject a transport instead of the HTTP one (tests, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn AudioTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<AnalysisClient> {
        let config = self.config;
        if config.min_payload_bytes > config.max_payload_bytes {
            return Err(Error::configuration_with_context(
                "min_payload_bytes exceeds max_payload_bytes",
                ErrorContext::new()
                    .with_field_path("config.min_payload_bytes")
                    .with_source("client_builder"),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be positive",
                ErrorContext::new()
                    .with_field_path("config.timeout_ms")
                    .with_source("client_builder"),
            ));
        }

        let transport: Arc<dyn AudioTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(
                config.endpoint()?,
                config.api_key.clone(),
            )?),
        };

        let defaults = RetryPolicy::default();
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay: self.base_delay.unwrap_or(defaults.base_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
        };
        let validator = AudioValidator::new(config.validator_config());

        Ok(AnalysisClient::new(
            transport,
            validator,
            policy,
            config.timeout(),
            config.auto_retry,
        ))
    }
}

impl Default for AnalysisClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
