
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::predict::{Contribution, RiskFactor};
use crate::{Result, TriageError};

/// First-trimester measurements feeding the early-pregnancy-loss score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EplInputs {
    /// Maternal age in years
    pub maternal_age: f64,
    /// Endometrium thickness in mm
    pub endometrium_mm: f64,
    /// Gestational sac diameter in mm
    pub gestational_sac_mm: f64,
    /// Embryo (crown-rump) length in mm
    pub embryo_length_mm: f64,
    /// Yolk sac diameter in mm
    pub yolk_sac_mm: f64,
    /// Embryonic heart rate in bpm
    pub heart_rate_bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl fmt::Display for RiskLevel {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        };
        f.write_str(label)
    }
}

/// Graded early-pregnancy-loss assessment with the factors that drove it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EplAssessment {
    pub score: u32,
    /// Risk as a percentage in [0, 100]
    pub risk_percent: u8,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
}

impl EplAssessment {
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.risk_percent > 100 {
            return Err(TriageError::Prediction(format!(
                "EPL risk percent {} is outside [0, 100]",
                self.risk_percent
            )));
        }
        Ok(())
    }
}

/// Score the six clinical measurements against graded thresholds.
///
/// Each measurement contributes 0 to 3 points; the total maps to a risk
/// percentage (5 points per percent band, capped at 100) and one of four risk
/// levels. Input range checking is the caller's responsibility.
#[inline]
pub fn assess(inputs: &EplInputs) -> EplAssessment {
    let mut score = 0u32;
    let mut factors = Vec::new();

    let mut add = |points: u32, name: &str, value: f64, summary: &str| {
        score += points;
        factors.push(RiskFactor {
            name: name.to_string(),
            value,
            contribution: Contribution::Increases,
            summary: summary.to_string(),
        });
    };

    let age = inputs.maternal_age;
    if (30.0..35.0).contains(&age) {
        add(
            1,
            "maternal age",
            age,
            "Maternal age 30-34 slightly increases EPL risk.",
        );
    } else if (35.0..40.0).contains(&age) {
        add(
            2,
            "maternal age",
            age,
            "Maternal age 35-39 moderately increases EPL risk.",
        );
    } else if age >= 40.0 {
        add(
            3,
            "maternal age",
            age,
            "Maternal age >=40 strongly increases EPL risk.",
        );
    }

    let endometrium = inputs.endometrium_mm;
    if (7.0..9.0).contains(&endometrium) {
        add(
            1,
            "endometrium thickness",
            endometrium,
            "Endometrium 7-8.9 mm shows borderline receptivity.",
        );
    } else if endometrium < 7.0 {
        add(
            2,
            "endometrium thickness",
            endometrium,
            "Endometrium <7 mm indicates poor uterine lining.",
        );
    }

    let sac = inputs.gestational_sac_mm;
    if (14.0..18.0).contains(&sac) {
        add(
            1,
            "gestational sac diameter",
            sac,
            "GSD 14-17.9 mm slightly smaller than expected.",
        );
    } else if sac < 14.0 {
        add(
            2,
            "gestational sac diameter",
            sac,
            "GSD <14 mm suggests delayed growth.",
        );
    }

    let embryo = inputs.embryo_length_mm;
    if (1.5..3.0).contains(&embryo) {
        add(
            1,
            "embryo length",
            embryo,
            "Embryo length 1.5-2.9 mm indicates slower growth.",
        );
    } else if embryo < 1.5 {
        add(
            2,
            "embryo length",
            embryo,
            "Embryo length <1.5 mm indicates poor development.",
        );
    }

    let yolk = inputs.yolk_sac_mm;
    if !(3.0..=4.0).contains(&yolk) {
        add(
            1,
            "yolk sac diameter",
            yolk,
            "Abnormal yolk sac size increases risk.",
        );
    }

    let heart_rate = inputs.heart_rate_bpm;
    if (60.0..100.0).contains(&heart_rate) {
        add(
            1,
            "embryonic heart rate",
            heart_rate,
            "Heart rate 60-99 bpm may indicate distress.",
        );
    } else if heart_rate < 60.0 {
        add(
            2,
            "embryonic heart rate",
            heart_rate,
            "Heart rate <60 bpm predicts EPL.",
        );
    }

    let risk_percent = (score * 5).min(100) as u8;
    let risk_level = if risk_percent < 30 {
        RiskLevel::Low
    } else if risk_percent < 60 {
        RiskLevel::Moderate
    } else if risk_percent < 80 {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    };

    debug!(
        "EPL assessment: score {}, {}% ({})",
        score, risk_percent, risk_level
    );

    EplAssessment {
        score,
        risk_percent,
        risk_level,
        factors,
    }
}
