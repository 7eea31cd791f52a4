use anyhow::Context;
use console::style;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, get_config_dir};
use crate::corpus::{self, CorpusIndex};
use crate::embedding::OllamaEncoder;
use crate::llm::LlmClient;
use crate::predict::{CtgOutcome, EplInputs, Prediction, epl};
use crate::report::{self, AssessmentReport};
use crate::retrieval::AdviceRetriever;
use crate::Result;

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().map_err(|e| crate::TriageError::Config(e.to_string()))?;
    Ok(Config::load(config_dir)?)
}

/// Print the active configuration as TOML
#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().map_err(|e| crate::TriageError::Config(e.to_string()))?;
    let config = Config::load(&config_dir)?;

    println!("Configuration directory: {}", config_dir.display());
    println!();
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

/// Load the corpus, build the index against the configured encoder, and wire
/// up the retrieval facade. One-time blocking startup work.
fn build_retriever(config: &Config) -> Result<AdviceRetriever> {
    let encoder = Arc::new(OllamaEncoder::new(&config.encoder)?);
    encoder.ping()?;

    let documents = corpus::load_documents(&config.retrieval.corpus_path)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Embedding {} advice documents...", documents.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let index = CorpusIndex::build(documents, encoder.as_ref());
    spinner.finish_and_clear();

    Ok(AdviceRetriever::new(encoder, index?))
}

/// Ad-hoc advice retrieval for a free-text clinical summary
#[inline]
pub fn query_advice(text: &str, top_k: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let k = top_k.unwrap_or(config.retrieval.top_k);

    let retriever = build_retriever(&config)?;
    info!("Corpus ready with {} documents", retriever.corpus_len());

    let results = retriever.retrieve(text, k)?;

    println!(
        "{}",
        style(format!("Top {} advice passages:", results.len())).bold()
    );
    println!();
    for (position, ranked) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("[{}]", position + 1)).cyan(),
            ranked.document.advice,
            style(format!("(score {:.3})", ranked.score)).dim()
        );
        if !ranked.document.source.is_empty() {
            match ranked.document.page_number {
                Some(page) => println!("    Source: {}, p.{}", ranked.document.source, page),
                None => println!("    Source: {}", ranked.document.source),
            }
        }
    }
    Ok(())
}

/// Run the full assessment from clinical measurements and classifier output
#[inline]
pub fn run_assessment(
    epl_inputs: EplInputs,
    ctg: Option<(i64, f32)>,
    synthesize: bool,
    json_output: bool,
) -> Result<()> {
    let config = load_config()?;

    let mut predictions = vec![Prediction::Epl(epl::assess(&epl_inputs))];
    if let Some((class_index, confidence)) = ctg {
        let outcome = CtgOutcome::from_classifier(class_index, confidence, Vec::new())?;
        predictions.push(Prediction::Ctg(outcome));
    }

    let retriever = build_retriever(&config)?;

    let llm = if synthesize {
        Some(LlmClient::new(&config.llm)?)
    } else {
        None
    };

    let report = report::run_assessment(
        predictions,
        &retriever,
        llm.as_ref(),
        config.retrieval.top_k,
    )?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to render report as JSON")?
        );
    } else {
        render_report(&report);
    }
    Ok(())
}

fn render_report(report: &AssessmentReport) {
    println!("{}", style("Assessment").bold().underlined());
    println!();

    for prediction in &report.predictions {
        println!("  {}", style(prediction.to_string()).bold());
        for factor in prediction.factors() {
            println!("    - {}", factor.summary);
        }
    }

    if let Some(advice) = &report.advice {
        println!();
        println!("{}", style("Relevant advice").bold());
        for (position, ranked) in advice.iter().enumerate() {
            println!(
                "  [{}] {} (Source: {})",
                position + 1,
                ranked.document.advice,
                ranked.document.source
            );
        }
    }

    if let Some(synthesis) = &report.synthesis {
        println!();
        println!("{}", style("Recommendations").bold());
        println!(
            "  {} ({:.0}% confidence): {}",
            synthesis.classification,
            synthesis.confidence * 100.0,
            synthesis.reason
        );
        for recommendation in &synthesis.recommendations {
            println!(
                "  - {} (Source: {})",
                recommendation.advice, recommendation.source
            );
        }
    }

    for warning in &report.warnings {
        println!();
        println!("{} {}", style("warning:").yellow().bold(), warning);
    }
}

/// Validate the corpus file and print its shape without embedding anything
#[inline]
pub fn corpus_status() -> Result<()> {
    let config = load_config()?;

    let documents = corpus::load_documents(&config.retrieval.corpus_path)?;

    println!(
        "Corpus: {} ({} documents)",
        config.retrieval.corpus_path.display(),
        documents.len()
    );

    let mut sources: Vec<&str> = documents
        .iter()
        .map(|d| d.source.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    sources.sort_unstable();
    sources.dedup();

    println!("Sources cited: {}", sources.len());
    for source in sources {
        println!("  - {}", source);
    }
    Ok(())
}
