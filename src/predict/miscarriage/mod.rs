#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::predict::{RiskFactor, normalize_confidence};
use crate::{Result, TriageError};

/// Validated miscarriage-risk classifier output.
///
/// The classifier is an external collaborator (a pretrained tabular model);
/// this adapter only admits its output contract: a risk label, a probability,
/// and attribution-derived factor snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscarriageOutcome {
    pub label: String,
    /// Probability in [0, 1]
    pub probability: f32,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
}

impl MiscarriageOutcome {
    #[inline]
    pub fn from_classifier(
        label: impl Into<String>,
        probability: f32,
        factors: Vec<RiskFactor>,
    ) -> Result<Self> {
        let outcome = Self {
            label: label.into(),
            probability: normalize_confidence(probability)?,
            factors,
        };
        outcome.validate()?;
        Ok(outcome)
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(TriageError::Prediction(
                "Miscarriage risk label cannot be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.probability) {
            return Err(TriageError::Prediction(format!(
                "Miscarriage probability {} is outside [0, 1]",
                self.probability
            )));
        }

        Ok(())
    }
}
