pub mod types;
pub mod describer;
pub mod sanitize;
pub mod prompt;
pub mod parser;
pub mod llm;
pub mod adapter;
pub mod classify;
pub mod summary;
pub mod orchestrator;
pub mod batch;

pub use types::*;
pub use describer::*;
pub use sanitize::*;
pub use prompt::*;
pub use parser::*;
pub use llm::*;
pub use adapter::*;
pub use classify::*;
pub use summary::*;
pub use orchestrator::*;
pub use batch::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("AI service is not reachable at {0}")]
    LlmConnection(String),

    #[error("AI service returned error (status {status}): {body}")]
    LlmError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("AI service returned no text")]
    EmptyResponse,

    #[error("No API key configured for the AI service")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
