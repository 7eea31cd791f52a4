
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::predict::{RiskFactor, normalize_confidence};
use crate::{Result, TriageError};

/// Width of the tabular feature vector the external CTG classifier consumes
pub const CTG_FEATURE_COUNT: usize = 21;

/// Cardiotocography outcome classes, in classifier output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CtgClass {
    Normal,
    Suspect,
    Pathological,
}

impl CtgClass {
    /// Map the classifier's class index; anything outside the known classes
    /// is rejected rather than carried forward as an unknown label.
    #[inline]
    pub fn from_index(index: i64) -> Result<Self> {
        match index {
            0 => Ok(CtgClass::Normal),
            1 => Ok(CtgClass::Suspect),
            2 => Ok(CtgClass::Pathological),
            other => Err(TriageError::Prediction(format!(
                "Unknown CTG class index: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CtgClass {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CtgClass::Normal => "Normal",
            CtgClass::Suspect => "Suspect",
            CtgClass::Pathological => "Pathological",
        };
        f.write_str(label)
    }
}

/// Validated CTG classifier output.
///
/// The classifier itself (gradient-boosted trees or similar, loaded from a
/// model file) is an external collaborator; only this output contract enters
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtgOutcome {
    pub class: CtgClass,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Attribution-derived factor summaries, most significant first
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
}

impl CtgOutcome {
    /// Build from the raw classifier output: a class index and a confidence
    /// given either as a fraction or a percentage.
    #[inline]
    pub fn from_classifier(index: i64, confidence: f32, factors: Vec<RiskFactor>) -> Result<Self> {
        let outcome = Self {
            class: CtgClass::from_index(index)?,
            confidence: normalize_confidence(confidence)?,
            factors,
        };
        Ok(outcome)
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(TriageError::Prediction(format!(
                "CTG confidence {} is outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Check that a feature vector matches the classifier's expected width
#[inline]
pub fn validate_feature_width(features: &[f64]) -> Result<()> {
    if features.len() != CTG_FEATURE_COUNT {
        return Err(TriageError::Prediction(format!(
            "CTG classifier expects {} features, got {}",
            CTG_FEATURE_COUNT,
            features.len()
        )));
    }
    Ok(())
}
