// Prediction adapters
// Validated structured records built from classifier output, consumed by the
// report layer to construct retrieval queries

#[cfg(test)]
mod tests;

pub mod ctg;
pub mod epl;
pub mod miscarriage;

pub use ctg::{CTG_FEATURE_COUNT, CtgClass, CtgOutcome};
pub use epl::{EplAssessment, EplInputs, RiskLevel};
pub use miscarriage::MiscarriageOutcome;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, TriageError};

/// Direction of a factor's contribution to the predicted risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contribution {
    Increases,
    Decreases,
    Neutral,
}

/// One contributing factor behind a prediction: the measured value plus a
/// natural-language summary suitable for retrieval queries and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub value: f64,
    pub contribution: Contribution,
    pub summary: String,
}

/// A classifier result in one of the known shapes.
///
/// Built immediately after the external classifier call; anything that does
/// not match a known shape is rejected here rather than propagated as an
/// untyped map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum Prediction {
    #[serde(rename = "CTG")]
    Ctg(CtgOutcome),
    #[serde(rename = "EPL")]
    Epl(EplAssessment),
    #[serde(rename = "Miscarriage")]
    Miscarriage(MiscarriageOutcome),
}

impl Prediction {
    /// Parse and validate a prediction from an untyped JSON value.
    #[inline]
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let prediction: Prediction = serde_json::from_value(value)
            .map_err(|e| TriageError::Prediction(format!("Unrecognized prediction shape: {}", e)))?;
        prediction.validate()?;
        Ok(prediction)
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        match self {
            Prediction::Ctg(outcome) => outcome.validate(),
            Prediction::Epl(assessment) => assessment.validate(),
            Prediction::Miscarriage(outcome) => outcome.validate(),
        }
    }

    /// The condition this prediction covers
    #[inline]
    pub fn condition(&self) -> &'static str {
        match self {
            Prediction::Ctg(_) => "CTG",
            Prediction::Epl(_) => "EPL",
            Prediction::Miscarriage(_) => "Miscarriage",
        }
    }

    /// The predicted class or risk level as shown to clinicians
    #[inline]
    pub fn label(&self) -> String {
        match self {
            Prediction::Ctg(outcome) => outcome.class.to_string(),
            Prediction::Epl(assessment) => assessment.risk_level.to_string(),
            Prediction::Miscarriage(outcome) => outcome.label.clone(),
        }
    }

    /// Confidence in [0, 1]
    #[inline]
    pub fn confidence(&self) -> f32 {
        match self {
            Prediction::Ctg(outcome) => outcome.confidence,
            Prediction::Epl(assessment) => f32::from(assessment.risk_percent) / 100.0,
            Prediction::Miscarriage(outcome) => outcome.probability,
        }
    }

    /// The contributing factors behind the prediction, most significant first
    #[inline]
    pub fn factors(&self) -> &[RiskFactor] {
        match self {
            Prediction::Ctg(outcome) => &outcome.factors,
            Prediction::Epl(assessment) => &assessment.factors,
            Prediction::Miscarriage(outcome) => &outcome.factors,
        }
    }

    /// Short `condition: label` fragment used to assemble retrieval queries
    #[inline]
    pub fn query_fragment(&self) -> String {
        format!("{}: {}", self.condition(), self.label())
    }
}

impl fmt::Display for Prediction {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({:.0}%)",
            self.condition(),
            self.label(),
            self.confidence() * 100.0
        )
    }
}

/// Normalize a classifier confidence given either as a fraction in [0, 1] or
/// a percentage in (1, 100].
pub(crate) fn normalize_confidence(raw: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&raw) {
        Ok(raw)
    } else if raw > 1.0 && raw <= 100.0 {
        Ok(raw / 100.0)
    } else {
        Err(TriageError::Prediction(format!(
            "Confidence {} is outside [0, 1] and [0, 100]",
            raw
        )))
    }
}
