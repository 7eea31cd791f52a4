use clap::{Parser, Subcommand};
use perinatal_triage::Result;
use perinatal_triage::commands::{corpus_status, query_advice, run_assessment, show_config};
use perinatal_triage::predict::EplInputs;

#[derive(Parser)]
#[command(name = "perinatal-triage")]
#[command(about = "Pregnancy-risk triage with semantic advice retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active configuration
    Config,
    /// Retrieve advice for a free-text clinical summary
    Query {
        /// The clinical summary to search with
        text: String,
        /// Number of advice passages to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Run a full risk assessment from clinical measurements
    Assess {
        /// Maternal age in years
        #[arg(long)]
        maternal_age: f64,
        /// Endometrium thickness in mm
        #[arg(long)]
        endometrium: f64,
        /// Gestational sac diameter in mm
        #[arg(long)]
        gestational_sac: f64,
        /// Embryo length in mm
        #[arg(long)]
        embryo_length: f64,
        /// Yolk sac diameter in mm
        #[arg(long)]
        yolk_sac: f64,
        /// Embryonic heart rate in bpm
        #[arg(long)]
        heart_rate: f64,
        /// CTG class index from the external classifier (0=Normal, 1=Suspect, 2=Pathological)
        #[arg(long)]
        ctg_class: Option<i64>,
        /// CTG classifier confidence, as a fraction or percentage
        #[arg(long, requires = "ctg_class")]
        ctg_confidence: Option<f32>,
        /// Skip the LLM synthesis step
        #[arg(long)]
        no_synthesis: bool,
        /// Emit the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Validate the advice corpus and show its shape
    Corpus,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config => {
            show_config()?;
        }
        Commands::Query { text, top_k } => {
            query_advice(&text, top_k)?;
        }
        Commands::Assess {
            maternal_age,
            endometrium,
            gestational_sac,
            embryo_length,
            yolk_sac,
            heart_rate,
            ctg_class,
            ctg_confidence,
            no_synthesis,
            json,
        } => {
            let epl_inputs = EplInputs {
                maternal_age,
                endometrium_mm: endometrium,
                gestational_sac_mm: gestational_sac,
                embryo_length_mm: embryo_length,
                yolk_sac_mm: yolk_sac,
                heart_rate_bpm: heart_rate,
            };
            let ctg = ctg_class.zip(ctg_confidence);
            run_assessment(epl_inputs, ctg, !no_synthesis, json)?;
        }
        Commands::Corpus => {
            corpus_status()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["perinatal-triage", "corpus"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Corpus);
        }
    }

    #[test]
    fn query_command_with_text() {
        let cli = Cli::try_parse_from(["perinatal-triage", "query", "heart rate 55 bpm"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Query { text, top_k } = parsed.command {
                assert_eq!(text, "heart rate 55 bpm");
                assert_eq!(top_k, None);
            }
        }
    }

    #[test]
    fn query_command_with_top_k() {
        let cli = Cli::try_parse_from([
            "perinatal-triage",
            "query",
            "low heart rate",
            "--top-k",
            "5",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Query { top_k, .. } = parsed.command {
                assert_eq!(top_k, Some(5));
            }
        }
    }

    #[test]
    fn assess_command_requires_measurements() {
        let cli = Cli::try_parse_from(["perinatal-triage", "assess", "--maternal-age", "34"]);
        assert!(cli.is_err());
    }

    #[test]
    fn assess_command_full() {
        let cli = Cli::try_parse_from([
            "perinatal-triage",
            "assess",
            "--maternal-age",
            "41",
            "--endometrium",
            "6.5",
            "--gestational-sac",
            "12",
            "--embryo-length",
            "1.2",
            "--yolk-sac",
            "5",
            "--heart-rate",
            "55",
            "--ctg-class",
            "2",
            "--ctg-confidence",
            "0.9",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Assess {
                maternal_age,
                ctg_class,
                no_synthesis,
                ..
            } = parsed.command
            {
                assert!((maternal_age - 41.0).abs() < f64::EPSILON);
                assert_eq!(ctg_class, Some(2));
                assert!(!no_synthesis);
            }
        }
    }

    #[test]
    fn ctg_confidence_requires_class() {
        let cli = Cli::try_parse_from([
            "perinatal-triage",
            "assess",
            "--maternal-age",
            "30",
            "--endometrium",
            "9",
            "--gestational-sac",
            "20",
            "--embryo-length",
            "4",
            "--yolk-sac",
            "3.5",
            "--heart-rate",
            "120",
            "--ctg-confidence",
            "0.8",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["perinatal-triage", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["perinatal-triage", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
