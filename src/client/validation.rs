//! 音频预检：在任何网络请求之前校验大小与媒体类型。
//!
//! Pre-flight audio validation.

use crate::types::payload::{essence, DEFAULT_MEDIA_TYPE};
use crate::types::AudioPayload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MIN_PAYLOAD_BYTES: usize = 1024;

/// Media types the analysis service accepts.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "audio/webm",
    "audio/mp3",
    "audio/mpeg",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/ogg",
    "audio/mp4",
    "audio/aac",
];

/// Why a payload was rejected before upload. `Display` is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No audio data provided.")]
    EmptyPayload,

    #[error("Audio file is too large. Maximum size is {}.", crate::types::format_size(*.max as u64))]
    TooLarge { size: usize, max: usize },

    #[error("Audio file appears to be empty or too small.")]
    TooSmall { size: usize, min: usize },

    #[error("Unsupported audio format. Please use MP3, WAV, WebM, or OGG files.")]
    UnsupportedFormat { media_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub max_bytes: usize,
    pub min_bytes: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            min_bytes: DEFAULT_MIN_PAYLOAD_BYTES,
        }
    }
}

/// Size and media-type gate run before any network attempt.
#[derive(Debug, Clone, Default)]
pub struct AudioValidator {
    config: ValidatorConfig,
}

impl AudioValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Checks, in order: empty (or absent), too large, too small, media type.
    ///
    /// Accepts `&AudioPayload` or an `Option` of one; `None` means nothing was
    /// picked or recorded.
    pub fn validate<'a>(
        &self,
        payload: impl Into<Option<&'a AudioPayload>>,
    ) -> Result<(), ValidationError> {
        let Some(payload) = payload.into() else {
            return Err(ValidationError::EmptyPayload);
        };
        let size = payload.len();
        if size == 0 {
            return Err(ValidationError::EmptyPayload);
        }
        if size > self.config.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.config.max_bytes,
            });
        }
        if size < self.config.min_bytes {
            return Err(ValidationError::TooSmall {
                size,
                min: self.config.min_bytes,
            });
        }

        let declared = essence(payload.media_type());
        let media_type = if declared.is_empty() {
            DEFAULT_MEDIA_TYPE.to_string()
        } else {
            declared
        };
        if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(ValidationError::UnsupportedFormat {
                media_type: payload.media_type().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(size: usize, media_type: &str) -> AudioPayload {
        AudioPayload::from_file("clip", vec![0u8; size], media_type)
    }

    #[test]
    fn test_size_bounds() {
        let v = AudioValidator::default();
        assert_eq!(v.validate(&payload(0, "audio/wav")), Err(ValidationError::EmptyPayload));
        assert!(matches!(
            v.validate(&payload(1023, "audio/wav")),
            Err(ValidationError::TooSmall { size: 1023, min: 1024 })
        ));
        assert!(v.validate(&payload(1024, "audio/wav")).is_ok());
        assert!(v.validate(&payload(DEFAULT_MAX_PAYLOAD_BYTES, "audio/wav")).is_ok());
        assert!(matches!(
            v.validate(&payload(DEFAULT_MAX_PAYLOAD_BYTES + 1, "audio/wav")),
            Err(ValidationError::TooLarge { .. })
        ));
        assert_eq!(v.validate(None), Err(ValidationError::EmptyPayload));
        let clip = payload(2048, "audio/wav");
        assert!(v.validate(Some(&clip)).is_ok());
    }

    #[test]
    fn test_media_types() {
        let v = AudioValidator::default();
        for mt in SUPPORTED_MEDIA_TYPES {
            assert!(v.validate(&payload(2048, mt)).is_ok(), "{} should pass", mt);
        }
        assert!(v.validate(&payload(2048, "")).is_ok());
        assert!(v.validate(&payload(2048, "audio/webm;codecs=opus")).is_ok());
        assert!(v.validate(&payload(2048, "AUDIO/MPEG")).is_ok());

        for mt in ["audio/flac", "video/mp4", "text/plain", "application/octet-stream"] {
            assert_eq!(
                v.validate(&payload(2048, mt)),
                Err(ValidationError::UnsupportedFormat {
                    media_type: mt.to_string()
                })
            );
        }
    }

    #[test]
    fn test_size_checked_before_format() {
        let v = AudioValidator::default();
        assert!(matches!(
            v.validate(&payload(10, "text/plain")),
            Err(ValidationError::TooSmall { .. })
        ));
    }

    #[test]
    fn test_user_facing_messages() {
        let e = ValidationError::TooLarge {
            size: DEFAULT_MAX_PAYLOAD_BYTES + 1,
            max: DEFAULT_MAX_PAYLOAD_BYTES,
        };
        assert_eq!(e.to_string(), "Audio file is too large. Maximum size is 10 MB.");
    }

    #[test]
    fn test_custom_limits() {
        let v = AudioValidator::new(ValidatorConfig {
            max_bytes: 4096,
            min_bytes: 16,
        });
        assert!(v.validate(&payload(16, "audio/ogg")).is_ok());
        assert!(matches!(
            v.validate(&payload(4097, "audio/ogg")),
            Err(ValidationError::TooLarge { max: 4096, .. })
        ));
    }
}
