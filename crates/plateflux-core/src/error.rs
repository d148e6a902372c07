// crates/plateflux-core/src/error.rs

use plateflux_parser::ParserError;
use thiserror::Error;

use crate::conditions::ConditionsError;
use crate::config::ConfigError;
use crate::outputs::OutputError;
use crate::swap::SwapParseError;
use crate::timeline::TimelineError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Plate export parsing failed: {0}")]
    Parser(#[from] ParserError),

    #[error("Conditions key error: {0}")]
    Conditions(#[from] ConditionsError),

    #[error("Timeline reconstruction failed: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid swap: {0}")]
    Swap(#[from] SwapParseError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
