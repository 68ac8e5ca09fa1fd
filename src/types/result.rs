//! 分析结果：远程服务返回的判定、分数与信号分解，以及响应结构校验。
//!
//! Analysis results and response-schema validation.
//!
//! The service has shipped two shapes for the per-detector breakdown:
//!
//! - `signals`: `{ "<name>": { "confidence": f, "weight": f } }`
//! - `technicalDetails` (older): `{ "<category>": ["finding", ...] }`
//!
//! Both are normalized into the canonical [`SignalContribution`] map. When a
//! body carries both, `signals` wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Allowed drift of `human_probability + synthetic_probability` from 1.
pub const PROVENANCE_TOLERANCE: f64 = 0.01;

/// Verdict on the submitted speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Human speech (`AUTHENTIC`, `BONAFIDE` on the wire)
    Authentic,
    /// Synthetic speech (`SPOOF`, `SYNTHETIC` on the wire)
    Spoof,
    /// Service could not decide
    Uncertain,
}

impl Decision {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTHENTIC" | "BONAFIDE" => Some(Self::Authentic),
            "SPOOF" | "SYNTHETIC" => Some(Self::Spoof),
            "UNCERTAIN" => Some(Self::Uncertain),
            _ => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Spoof)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub authenticity_score: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub human_probability: f64,
    pub synthetic_probability: f64,
}

/// One sub-detector's share of the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub confidence: f64,
    pub weight: f64,
    /// Free-text findings; only populated from `technicalDetails` bodies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<String>,
}

/// Schema-validated verdict from the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub decision: Decision,
    pub scores: Scores,
    pub provenance: Provenance,
    pub signals: BTreeMap<String, SignalContribution>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Response body does not match the result schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Invalid response format: body is not a JSON object")]
    NotAnObject,

    #[error("Invalid response format: missing field '{0}'")]
    MissingField(String),

    #[error("Invalid response format: invalid {field} ({reason})")]
    InvalidField { field: String, reason: String },

    #[error("Invalid response format: {field} = {value} is outside [0, 1]")]
    OutOfRange { field: String, value: f64 },
}

impl SchemaError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Deserialize)]
struct WireSignal {
    confidence: f64,
    weight: f64,
}

impl AnalysisResult {
    /// Validate a decoded response body and build the canonical result.
    pub fn from_json(body: &Value) -> Result<Self, SchemaError> {
        let obj = body.as_object().ok_or(SchemaError::NotAnObject)?;

        for field in ["decision", "scores", "provenance"] {
            require(obj, field)?;
        }
        if !obj.contains_key("signals") && !obj.contains_key("technicalDetails") {
            return Err(SchemaError::MissingField("signals".to_string()));
        }
        require(obj, "explanation")?;

        let decision = obj["decision"]
            .as_str()
            .and_then(Decision::from_wire)
            .ok_or_else(|| SchemaError::invalid("decision", format!("unexpected value {}", obj["decision"])))?;

        let scores: Scores = nested(obj, "scores")?;
        check_unit("scores.authenticity_score", scores.authenticity_score)?;
        check_unit("scores.confidence", scores.confidence)?;
        if let Some(t) = scores.trust_index {
            check_unit("scores.trust_index", t)?;
        }

        let provenance: Provenance = nested(obj, "provenance")?;
        check_unit("provenance.human_probability", provenance.human_probability)?;
        check_unit("provenance.synthetic_probability", provenance.synthetic_probability)?;
        let total = provenance.human_probability + provenance.synthetic_probability;
        if (total - 1.0).abs() > PROVENANCE_TOLERANCE {
            return Err(SchemaError::invalid(
                "provenance",
                format!("probabilities sum to {}", total),
            ));
        }

        let signals: BTreeMap<String, SignalContribution> = if obj.contains_key("signals") {
            let wire: BTreeMap<String, WireSignal> = nested(obj, "signals")?;
            wire.into_iter()
                .map(|(name, s)| {
                    (
                        name,
                        SignalContribution {
                            confidence: s.confidence,
                            weight: s.weight,
                            findings: Vec::new(),
                        },
                    )
                })
                .collect()
        } else {
            let details: BTreeMap<String, Vec<String>> = nested(obj, "technicalDetails")?;
            from_technical_details(details)
        };
        for (name, s) in &signals {
            check_unit(&format!("signals.{}.confidence", name), s.confidence)?;
            check_unit(&format!("signals.{}.weight", name), s.weight)?;
        }

        let explanation = obj["explanation"]
            .as_str()
            .ok_or_else(|| SchemaError::invalid("explanation", "expected a string"))?
            .to_string();
        let summary = obj.get("summary").and_then(|v| v.as_str()).map(String::from);

        Ok(Self {
            decision,
            scores,
            provenance,
            signals,
            explanation,
            summary,
        })
    }
}

fn require(obj: &Map<String, Value>, field: &str) -> Result<(), SchemaError> {
    if obj.contains_key(field) {
        Ok(())
    } else {
        Err(SchemaError::MissingField(field.to_string()))
    }
}

fn nested<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<T, SchemaError> {
    let value = &obj[field];
    if !value.is_object() {
        return Err(SchemaError::invalid(field, "expected an object"));
    }
    serde_json::from_value(value.clone()).map_err(|e| SchemaError::invalid(field, e.to_string()))
}

fn check_unit(field: &str, value: f64) -> Result<(), SchemaError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SchemaError::OutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

/// Adapt `technicalDetails` categories into signal contributions.
///
/// Findings such as `"AASIST confidence: 90.0%"` and `"Spectral analysis weight: 40%"`
/// supply the numbers; a category without them gets 0.0.
fn from_technical_details(
    details: BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, SignalContribution> {
    details
        .into_iter()
        .map(|(category, findings)| {
            let confidence = findings
                .iter()
                .find_map(|f| percent_after(f, "confidence:"))
                .unwrap_or(0.0);
            let weight = findings
                .iter()
                .find_map(|f| percent_after(f, "weight:"))
                .unwrap_or(0.0);
            (
                category,
                SignalContribution {
                    confidence,
                    weight,
                    findings,
                },
            )
        })
        .collect()
}

fn percent_after(finding: &str, label: &str) -> Option<f64> {
    let lower = finding.to_ascii_lowercase();
    let idx = lower.find(label)?;
    let rest = lower[idx + label.len()..].trim();
    let number = rest.split('%').next()?.trim();
    number.parse::<f64>().ok().map(|v| v / 100.0)
}
