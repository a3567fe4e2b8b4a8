// src/error.rs

use crate::options::OptionSpec;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("Invalid argument \"{value}\" for option {option}; should be {expected}")]
    InvalidValue {
        value: String,
        option: &'static OptionSpec,
        expected: &'static str,
    },

    #[error("A maximum of {max} {what} is supported")]
    CapacityExceeded {
        what: &'static str, // "models" or "features"
        max: usize,
        option: &'static OptionSpec,
    },

    #[error("Reference .y4m (-r/--reference) is required")]
    MissingReference,

    #[error("Distorted .y4m (-d/--distorted) is required")]
    MissingDistorted,

    #[error("At least one model file (-m/--model) is required")]
    MissingModel,
}

impl CliError {
    /// The option that triggered the error, if it is tied to one.
    pub fn option(&self) -> Option<&'static OptionSpec> {
        match self {
            CliError::InvalidValue { option, .. } | CliError::CapacityExceeded { option, .. } => {
                Some(*option)
            }
            _ => None,
        }
    }
}

// Define a standard Result type for the crate
pub type Result<T> = std::result::Result<T, CliError>;
