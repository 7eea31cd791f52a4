use super::*;
use serde_json::json;

#[test]
fn ctg_shape_parses_from_json() {
    let value = json!({
        "model": "CTG",
        "class": "Pathological",
        "confidence": 0.91,
    });

    let prediction = Prediction::from_json(value).expect("valid shape");
    assert_eq!(prediction.condition(), "CTG");
    assert_eq!(prediction.label(), "Pathological");
    assert!((prediction.confidence() - 0.91).abs() < 1e-6);
}

#[test]
fn epl_shape_parses_from_json() {
    let value = json!({
        "model": "EPL",
        "score": 7,
        "risk_percent": 35,
        "risk_level": "Moderate",
        "factors": [],
    });

    let prediction = Prediction::from_json(value).expect("valid shape");
    assert_eq!(prediction.condition(), "EPL");
    assert_eq!(prediction.label(), "Moderate");
    assert!((prediction.confidence() - 0.35).abs() < 1e-6);
}

#[test]
fn unrecognized_shape_is_rejected_early() {
    let value = json!({
        "model": "Palmistry",
        "class": "Lucky",
    });

    let err = Prediction::from_json(value).expect_err("unknown model tag must fail");
    assert!(matches!(err, TriageError::Prediction(_)));
}

#[test]
fn untagged_map_is_rejected() {
    let value = json!({"risk": "High", "confidence": 0.5});

    assert!(Prediction::from_json(value).is_err());
}

#[test]
fn out_of_range_values_fail_validation() {
    let value = json!({
        "model": "Miscarriage",
        "label": "High",
        "probability": 7.5,
    });

    let err = Prediction::from_json(value).expect_err("bad probability must fail");
    assert!(matches!(err, TriageError::Prediction(_)));
}

#[test]
fn query_fragments_name_condition_and_label() {
    let prediction = Prediction::Ctg(
        CtgOutcome::from_classifier(2, 0.9, Vec::new()).expect("valid outcome"),
    );
    assert_eq!(prediction.query_fragment(), "CTG: Pathological");

    let prediction = Prediction::Epl(epl::assess(&EplInputs {
        maternal_age: 41.0,
        endometrium_mm: 6.0,
        gestational_sac_mm: 12.0,
        embryo_length_mm: 1.0,
        yolk_sac_mm: 5.0,
        heart_rate_bpm: 55.0,
    }));
    assert_eq!(prediction.query_fragment(), "EPL: High");
}

#[test]
fn display_includes_confidence_percent() {
    let prediction = Prediction::Miscarriage(
        MiscarriageOutcome::from_classifier("Low", 0.12, Vec::new()).expect("valid outcome"),
    );
    assert_eq!(prediction.to_string(), "Miscarriage: Low (12%)");
}

#[test]
fn confidence_normalization_bounds() {
    assert!((normalize_confidence(0.0).expect("valid") - 0.0).abs() < 1e-6);
    assert!((normalize_confidence(1.0).expect("valid") - 1.0).abs() < 1e-6);
    assert!((normalize_confidence(50.0).expect("valid") - 0.5).abs() < 1e-6);
    assert!(normalize_confidence(-0.5).is_err());
    assert!(normalize_confidence(250.0).is_err());
}
