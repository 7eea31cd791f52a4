// Report assembly
// Turns typed predictions into a retrieval query, gathers advice, runs the
// synthesis call, and assembles the final assessment report


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::{AdviceReference, LlmClient, SynthesisOutcome};
use crate::predict::Prediction;
use crate::retrieval::{AdviceRetriever, RankedAdvice};
use crate::{Result, TriageError};

/// The assembled assessment handed to the rendering layer.
///
/// Advice and synthesis sections are optional: when retrieval or synthesis
/// fails the failure is recorded as a warning and the report is assembled
/// without that section, so the predictions still reach the clinician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub predictions: Vec<Prediction>,
    pub advice: Option<Vec<RankedAdvice>>,
    pub synthesis: Option<SynthesisOutcome>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Build the retrieval query string from the predictions.
///
/// Policy: short `condition: label` fragments joined in prediction order,
/// e.g. `"EPL: High, CTG: Pathological"`. The retrieval facade treats the
/// result as opaque text; this is where query construction lives.
#[inline]
pub fn build_query(predictions: &[Prediction]) -> Result<String> {
    if predictions.is_empty() {
        return Err(TriageError::InvalidArgument(
            "Cannot build a query from zero predictions".to_string(),
        ));
    }

    Ok(predictions
        .iter()
        .map(Prediction::query_fragment)
        .collect::<Vec<_>>()
        .join(", "))
}

/// Multi-line clinical summary used in the synthesis prompt
#[inline]
pub fn prediction_summary(predictions: &[Prediction]) -> String {
    predictions
        .iter()
        .map(|prediction| prediction.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Project ranked advice into the reference shape the synthesis call consumes
#[inline]
pub fn advice_references(advice: &[RankedAdvice]) -> Vec<AdviceReference> {
    advice
        .iter()
        .map(|ranked| AdviceReference {
            advice: ranked.document.advice.clone(),
            source: ranked.document.source.clone(),
        })
        .collect()
}

/// Run the full assessment: retrieve advice for the predictions, synthesize
/// recommendations, and assemble the report.
///
/// Passing no `llm` skips synthesis without a warning; a *failing* retrieval
/// or synthesis step degrades the report instead of aborting it.
#[inline]
pub fn run_assessment(
    predictions: Vec<Prediction>,
    retriever: &AdviceRetriever,
    llm: Option<&LlmClient>,
    top_k: usize,
) -> Result<AssessmentReport> {
    for prediction in &predictions {
        prediction.validate()?;
    }

    let query = build_query(&predictions)?;
    info!("Assessment query: {}", query);

    let mut warnings = Vec::new();

    let advice = match retriever.retrieve(&query, top_k) {
        Ok(advice) => Some(advice),
        Err(e) => {
            warn!("Advice retrieval failed, omitting advice section: {}", e);
            warnings.push(format!("Advice retrieval failed: {}", e));
            None
        }
    };

    let synthesis = match (&advice, llm) {
        (Some(advice), Some(client)) if !advice.is_empty() => {
            let summary = prediction_summary(&predictions);
            let references = advice_references(advice);
            match client.synthesize(&summary, &references) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!("Synthesis failed, omitting recommendations: {}", e);
                    warnings.push(format!("Recommendation synthesis failed: {}", e));
                    None
                }
            }
        }
        _ => None,
    };

    Ok(AssessmentReport {
        predictions,
        advice,
        synthesis,
        warnings,
        generated_at: Utc::now(),
    })
}
