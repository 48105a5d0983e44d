use crate::model::{AnalysisResult, EvidenceFactor};
use serde::Serialize;

pub const MEDIUM_THRESHOLD: f64 = 40.0;
pub const HIGH_THRESHOLD: f64 = 70.0;

/// Coarse severity derived from the clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBucket {
    Low,
    Medium,
    High,
}

impl ScoreBucket {
    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBucket::Low => "score-low",
            ScoreBucket::Medium => "score-medium",
            ScoreBucket::High => "score-high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBucket::Low => "low",
            ScoreBucket::Medium => "medium",
            ScoreBucket::High => "high",
        }
    }
}

/// Sign of an evidence factor's contribution. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Raises the risk.
    Negative,
    /// Lowers the risk or is neutral.
    Positive,
}

impl Polarity {
    pub fn of(risk_contribution: f64) -> Self {
        if risk_contribution > 0.0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Polarity::Negative => "factor-negative",
            Polarity::Positive => "factor-positive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceItem {
    pub finding: String,
    pub details: String,
    pub polarity: Polarity,
}

impl From<&EvidenceFactor> for EvidenceItem {
    fn from(factor: &EvidenceFactor) -> Self {
        Self {
            finding: factor.finding.clone(),
            details: factor.details.clone(),
            polarity: Polarity::of(factor.risk_contribution),
        }
    }
}

/// Immutable view-model of a rendered assessment, consumed by a view adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportModel {
    pub score: u8,
    pub bucket: ScoreBucket,
    /// Same order as the service returned them.
    pub items: Vec<EvidenceItem>,
}

impl ReportModel {
    pub fn score_label(&self) -> String {
        format!("{}%", self.score)
    }
}

/// Bucket of a score on its own scale, before any rounding for display.
pub fn bucket(score: f64) -> ScoreBucket {
    if score >= HIGH_THRESHOLD {
        ScoreBucket::High
    } else if score >= MEDIUM_THRESHOLD {
        ScoreBucket::Medium
    } else {
        ScoreBucket::Low
    }
}

/// Missing or non-finite is 0, otherwise clamped to [0, 100].
pub fn clamped_score(risk_score: Option<f64>) -> f64 {
    match risk_score {
        Some(score) if score.is_finite() => score.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Displayed score: the clamped score rounded to an integer.
pub fn display_score(risk_score: Option<f64>) -> u8 {
    clamped_score(risk_score).round() as u8
}

pub fn render(result: &AnalysisResult) -> ReportModel {
    let clamped = clamped_score(result.risk_score);

    let items = result
        .evidence_factors
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(EvidenceItem::from)
        .collect();

    ReportModel {
        score: clamped.round() as u8,
        bucket: bucket(clamped),
        items,
    }
}
