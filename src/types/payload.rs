//! Audio payloads awaiting analysis.

use bytes::Bytes;
use chrono::Utc;
use std::path::Path;

/// Media type assumed when a capture does not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "audio/webm";

/// Binary audio plus its declared media type.
///
/// Built once by a file picker or a recorder and never mutated afterwards.
/// Cloning is cheap: the bytes are reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    data: Bytes,
    media_type: String,
    file_name: String,
}

impl AudioPayload {
    /// A user-picked file. The declared media type is kept as given (it may be
    /// empty; validation treats that as [`DEFAULT_MEDIA_TYPE`]).
    pub fn from_file(
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    /// A microphone capture. Named `recording-<timestamp>.<ext>` after its media type.
    pub fn recording(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        let mut media_type = media_type.into();
        if media_type.trim().is_empty() {
            media_type = DEFAULT_MEDIA_TYPE.to_string();
        }
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
        let file_name = format!("recording-{}.{}", timestamp, extension_for(&media_type));
        Self {
            data: data.into(),
            media_type,
            file_name,
        }
    }

    /// Read a payload from disk, guessing the media type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = media_type_for_path(path).unwrap_or_default();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("audio")
            .to_string();
        Ok(Self::from_file(file_name, bytes, media_type))
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Declared media type, possibly empty.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Media type to put on the wire.
    pub fn effective_media_type(&self) -> &str {
        if self.media_type.trim().is_empty() {
            DEFAULT_MEDIA_TYPE
        } else {
            &self.media_type
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rough duration assuming 128 kbps compressed audio.
    pub fn estimated_duration_secs(&self) -> u64 {
        const AVG_BITRATE_KBPS: f64 = 128.0;
        let size_kib = self.data.len() as f64 / 1024.0;
        ((size_kib * 8.0) / AVG_BITRATE_KBPS).round() as u64
    }
}

/// Strip parameters and lowercase: `Audio/WebM; codecs=opus` → `audio/webm`.
pub(crate) fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn extension_for(media_type: &str) -> &'static str {
    match essence(media_type).as_str() {
        "audio/mp3" | "audio/mpeg" => "mp3",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/mp4" => "mp4",
        "audio/aac" => "aac",
        _ => "webm",
    }
}

/// Guess an audio media type from a file extension.
pub fn media_type_for_path(path: impl AsRef<Path>) -> Option<String> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "webm" => "audio/webm",
        "mp3" => "audio/mpeg",
        "wav" | "wave" => "audio/wav",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        _ => return None,
    };
    Some(mt.to_string())
}

/// Human-readable byte count using 1024-based units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}
