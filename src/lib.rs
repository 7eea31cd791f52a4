use thiserror::Error;

pub type Result<T> = std::result::Result<T, TriageError>;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Corpus load error: {0}")]
    CorpusLoad(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod llm;
pub mod predict;
pub mod report;
pub mod retrieval;
