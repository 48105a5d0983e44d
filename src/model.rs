use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message description sent to the analysis service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub sender: String,
    pub recipient: String,
    pub body: String,
}

impl AnalysisRequest {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            body: body.into(),
        }
    }
}

/// One signal contributing to (or mitigating) the overall risk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFactor {
    pub finding: String,
    pub details: String,
    pub risk_contribution: f64,
}

/// Assessment returned by the analysis service.
///
/// Both fields may be missing in the response; the renderer applies the
/// defaults (score 0, no evidence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_score: Option<f64>,
    pub evidence_factors: Option<Vec<EvidenceFactor>>,
}

impl AnalysisResult {
    pub fn new(risk_score: f64, evidence_factors: Vec<EvidenceFactor>) -> Self {
        Self {
            risk_score: Some(risk_score),
            evidence_factors: Some(evidence_factors),
        }
    }

    /// Build a result from an arbitrary JSON document without ever failing.
    ///
    /// Anything of the wrong shape is treated as absent: a non-object
    /// document yields an empty result, a non-numeric score is dropped,
    /// and each factor falls back to empty text and a zero contribution.
    pub fn from_json_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            log::debug!("Analysis response is not a JSON object, using defaults");
            return Self::default();
        };

        let risk_score = object
            .get("risk_score")
            .and_then(Value::as_f64)
            .filter(|score| score.is_finite());

        let evidence_factors = object
            .get("evidence_factors")
            .and_then(Value::as_array)
            .map(|factors| {
                factors
                    .iter()
                    .map(EvidenceFactor::from_json_value)
                    .collect::<Vec<_>>()
            });

        Self {
            risk_score,
            evidence_factors,
        }
    }
}

impl EvidenceFactor {
    fn from_json_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            finding: text("finding"),
            details: text("details"),
            risk_contribution: value
                .get("risk_contribution")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        }
    }
}
