//! 类型系统模块：音频载荷与分析结果。
//!
//! # Types Module
//!
//! Strongly-typed representations of what goes to the analysis service and what
//! comes back.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AudioPayload`] | Immutable audio bytes with declared media type and file name |
//! | [`AnalysisResult`] | Schema-validated verdict with scores, provenance and signals |
//! | [`Decision`] | Authentic / spoof / uncertain |
//! | [`SchemaError`] | Why a response body was rejected |
//!
//! ## Example
//!
//! ```rust
//! use voiceguard_client::types::{AudioPayload, format_size};
//!
//! let clip = AudioPayload::recording(vec![0u8; 2048], "audio/webm;codecs=opus");
//! assert!(clip.file_name().ends_with(".webm"));
//! assert_eq!(format_size(clip.len() as u64), "2 KB");
//! ```

pub mod payload;
pub mod result;

pub use payload::{format_size, media_type_for_path, AudioPayload, DEFAULT_MEDIA_TYPE};
pub use result::{
    AnalysisResult, Decision, Provenance, SchemaError, Scores, SignalContribution,
};
