//! Command-line front end of the VMAF quality tool: turns argv into validated [`Settings`].

pub mod cli;
pub mod error;
pub mod options;
pub mod settings;

pub use cli::{parse_args, try_parse_from};
pub use error::{CliError, Result};
pub use settings::Settings;
