// src/settings.rs

use crate::error::{CliError, Result};
use crate::options::{OptionKind, OptionSpec};
use log::trace;
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

pub const MAX_MODELS: usize = 32;
pub const MAX_FEATURES: usize = 32;

/// Validated invocation settings handed to the scoring pipeline.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub reference: PathBuf,
    pub distorted: PathBuf,
    pub models: Vec<PathBuf>,
    pub features: Vec<String>,
    /// 0 leaves the choice to the caller, see [`Settings::effective_threads`].
    pub threads: u32,
    pub version: bool,
}

impl Settings {
    /// Requested thread count, or the number of logical CPUs when none was given.
    pub fn effective_threads(&self) -> u32 {
        if self.threads == 0 {
            u32::try_from(num_cpus::get()).unwrap_or(u32::MAX)
        } else {
            self.threads
        }
    }
}

/// Accumulates option values during the argument scan.
#[derive(Debug, Default)]
pub(crate) struct SettingsBuilder {
    reference: Option<OsString>,
    distorted: Option<OsString>,
    models: Vec<OsString>,
    features: Vec<String>,
    threads: u32,
    version: bool,
}

impl SettingsBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Applies one recognized option. `value` is `Some` exactly when the option takes one.
    pub(crate) fn apply(&mut self, spec: &'static OptionSpec, value: Option<&OsStr>) -> Result<()> {
        let value = value.unwrap_or_default();
        match spec.kind {
            OptionKind::Reference => self.reference = Some(value.to_os_string()),
            OptionKind::Distorted => self.distorted = Some(value.to_os_string()),
            OptionKind::Model => {
                if self.models.len() == MAX_MODELS {
                    return Err(CliError::CapacityExceeded {
                        what: "models",
                        max: MAX_MODELS,
                        option: spec,
                    });
                }
                self.models.push(value.to_os_string());
            }
            OptionKind::Feature => {
                if self.features.len() == MAX_FEATURES {
                    return Err(CliError::CapacityExceeded {
                        what: "features",
                        max: MAX_FEATURES,
                        option: spec,
                    });
                }
                let name = utf8_value(value, spec, "a UTF-8 string")?;
                self.features.push(name.to_string());
            }
            OptionKind::Threads => {
                self.threads = parse_unsigned(utf8_value(value, spec, "an integer")?, spec)?;
            }
            OptionKind::Version => self.version = true,
        }
        trace!("Applied {} = {:?}", spec, value);
        Ok(())
    }

    /// Checks the required fields and hands out the finished settings.
    pub(crate) fn finish(self) -> Result<Settings> {
        let reference = self
            .reference
            .filter(|path| !path.is_empty())
            .ok_or(CliError::MissingReference)?;
        let distorted = self
            .distorted
            .filter(|path| !path.is_empty())
            .ok_or(CliError::MissingDistorted)?;
        if self.models.is_empty() {
            return Err(CliError::MissingModel);
        }

        Ok(Settings {
            reference: PathBuf::from(reference),
            distorted: PathBuf::from(distorted),
            models: self.models.into_iter().map(PathBuf::from).collect(),
            features: self.features,
            threads: self.threads,
            version: self.version,
        })
    }
}

fn utf8_value<'a>(
    value: &'a OsStr,
    option: &'static OptionSpec,
    expected: &'static str,
) -> Result<&'a str> {
    value.to_str().ok_or_else(|| CliError::InvalidValue {
        value: value.to_string_lossy().into_owned(),
        option,
        expected,
    })
}

/// Parses an unsigned integer with C-style base detection.
///
/// `0x` means hex, a leading `0` means octal, anything else is decimal.
pub fn parse_unsigned(value: &str, option: &'static OptionSpec) -> Result<u32> {
    let invalid = || CliError::InvalidValue {
        value: value.to_string(),
        option,
        expected: "an integer",
    };

    let (digits, radix) = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        (hex, 16)
    } else if value.len() > 1 && value.starts_with('0') {
        (&value[1..], 8)
    } else {
        (value, 10)
    };

    // from_str_radix tolerates a leading '+', strtoul-style signs are rejected here
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    u32::from_str_radix(digits, radix).map_err(|_| invalid())
}
