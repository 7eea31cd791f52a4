use super::*;
use crate::predict::Contribution;

#[test]
fn valid_output_is_admitted() {
    let outcome = MiscarriageOutcome::from_classifier(
        "High",
        0.72,
        vec![RiskFactor {
            name: "progesterone".to_string(),
            value: 8.1,
            contribution: Contribution::Increases,
            summary: "Low progesterone raises miscarriage risk.".to_string(),
        }],
    )
    .expect("valid output");

    assert_eq!(outcome.label, "High");
    assert!((outcome.probability - 0.72).abs() < 1e-6);
    assert_eq!(outcome.factors.len(), 1);
}

#[test]
fn percentage_probability_is_normalized() {
    let outcome =
        MiscarriageOutcome::from_classifier("Low", 15.0, Vec::new()).expect("valid output");
    assert!((outcome.probability - 0.15).abs() < 1e-6);
}

#[test]
fn empty_label_is_rejected() {
    let err = MiscarriageOutcome::from_classifier("  ", 0.5, Vec::new())
        .expect_err("blank label must fail");
    assert!(matches!(err, TriageError::Prediction(_)));
}

#[test]
fn out_of_range_probability_is_rejected() {
    assert!(MiscarriageOutcome::from_classifier("High", -0.2, Vec::new()).is_err());
    assert!(MiscarriageOutcome::from_classifier("High", 120.0, Vec::new()).is_err());
}
