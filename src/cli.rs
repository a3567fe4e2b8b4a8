// src/cli.rs

use crate::error::{CliError, Result};
use crate::options::{find_long, find_short, LongMatch, OptionSpec, OPTIONS};
use crate::settings::{Settings, SettingsBuilder};
use log::debug;
use std::env;
use std::ffi::OsStr;
use std::process;

/// Parses the process arguments, printing the reason and usage to stderr and exiting
/// with status 1 when they are invalid.
pub fn parse_args() -> Settings {
    let mut argv = env::args_os();
    let app = argv
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "vmaf".to_string());

    match try_parse_from(argv) {
        Ok(settings) => settings,
        Err(e) => {
            debug!("Argument parsing failed: {:?}", e);
            eprint!("{}", render_failure(&app, &e));
            process::exit(1);
        }
    }
}

/// Parses `args` (without the program name) into validated settings.
///
/// Accepts `-x VALUE`, `-xVALUE`, grouped short flags, `--long VALUE`, `--long=VALUE` and
/// unambiguous prefixes of long names. Anything unrecognized is skipped, and `--` stops the scan.
/// Path values keep their exact bytes, including ones that are not valid UTF-8.
pub fn try_parse_from<I, S>(args: I) -> Result<Settings>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<S> = args.into_iter().collect();
    let mut builder = SettingsBuilder::new();

    let mut i = 0;
    while i < args.len() {
        let raw = args[i].as_ref();
        i += 1;

        // Option names are ASCII, so a lossy view is enough to dispatch on
        let lossless = raw.to_str().is_some();
        let text = raw.to_string_lossy();
        let arg: &str = &text;

        if arg == "--" {
            debug!("End of options, skipping {} remaining argument(s)", args.len() - i);
            break;
        }

        if let Some(body) = arg.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            let spec = match find_long(name) {
                LongMatch::Found(spec) => spec,
                LongMatch::Ambiguous => {
                    debug!("Skipping ambiguous option: {:?}", raw);
                    continue;
                }
                LongMatch::Unknown => {
                    debug!("Skipping unrecognized option: {:?}", raw);
                    continue;
                }
            };

            if !spec.takes_value() {
                if inline.is_some() {
                    debug!("Option {} takes no value, skipping: {:?}", spec, raw);
                } else {
                    builder.apply(spec, None)?;
                }
                continue;
            }
            let value = match inline {
                Some(value) => attached_value(spec, value, lossless)?,
                None => match args.get(i) {
                    Some(next) => {
                        i += 1;
                        next.as_ref()
                    }
                    None => {
                        debug!("Option {} requires a value, skipping", spec);
                        continue;
                    }
                },
            };
            debug!("Option {} = {:?}", spec, value);
            builder.apply(spec, Some(value))?;
        } else if let Some(cluster) = arg.strip_prefix('-').filter(|rest| !rest.is_empty()) {
            for (pos, c) in cluster.char_indices() {
                let Some(spec) = find_short(c) else {
                    debug!("Skipping unrecognized option: -{}", c);
                    continue;
                };
                if !spec.takes_value() {
                    debug!("Option {}", spec);
                    builder.apply(spec, None)?;
                    continue;
                }

                // The first value-taking option consumes the rest of the cluster
                let attached = &cluster[pos + c.len_utf8()..];
                if !attached.is_empty() {
                    let value = attached_value(spec, attached, lossless)?;
                    debug!("Option {} = {:?}", spec, value);
                    builder.apply(spec, Some(value))?;
                } else if let Some(next) = args.get(i) {
                    i += 1;
                    debug!("Option {} = {:?}", spec, next.as_ref());
                    builder.apply(spec, Some(next.as_ref()))?;
                } else {
                    debug!("Option {} requires a value, skipping", spec);
                }
                break;
            }
        } else {
            debug!("Skipping non-option argument: {:?}", raw);
        }
    }

    builder.finish()
}

/// A value glued to its option in one token. Only a UTF-8 token splits without touching bytes.
fn attached_value<'a>(
    option: &'static OptionSpec,
    value: &'a str,
    lossless: bool,
) -> Result<&'a OsStr> {
    if lossless {
        Ok(OsStr::new(value))
    } else {
        Err(CliError::InvalidValue {
            value: value.to_string(),
            option,
            expected: "valid UTF-8 when attached to the option",
        })
    }
}

/// Usage synopsis listing every option in the table.
pub fn usage(app: &str) -> String {
    let mut text = format!("Usage: {} [options]\n\nSupported options:\n", app);
    for spec in OPTIONS {
        let form = match spec.value {
            Some(placeholder) => format!(" --{}/-{} {}:", spec.long, spec.short, placeholder),
            None => format!(" --{}/-{}:", spec.long, spec.short),
        };
        text.push_str(&format!("{:<28}{}\n", form, spec.help));
    }
    text
}

/// Full diagnostic for a failed invocation: the reason followed by the usage text.
pub fn render_failure(app: &str, err: &CliError) -> String {
    format!("{}\n\n{}", err, usage(app))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MAX_FEATURES, MAX_MODELS};
    use std::path::PathBuf;

    const BASE: [&str; 6] = ["-r", "ref.y4m", "-d", "dist.y4m", "-m", "model.json"];

    fn with_base(extra: &[&str]) -> Vec<String> {
        BASE.iter().chain(extra).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_basic_invocation() {
        let args = ["-r", "ref.y4m", "-d", "dist.y4m", "-m", "model1.json", "-t", "4"];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.reference, PathBuf::from("ref.y4m"));
        assert_eq!(settings.distorted, PathBuf::from("dist.y4m"));
        assert_eq!(settings.models, vec![PathBuf::from("model1.json")]);
        assert_eq!(settings.threads, 4);
        assert!(settings.features.is_empty());
        assert!(!settings.version);
    }

    #[test]
    fn test_long_forms() {
        let args = [
            "--reference", "ref.y4m",
            "--distorted=dist.y4m",
            "--model", "a.json",
            "--feature=psnr",
            "--threads", "2",
            "--version",
        ];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.distorted, PathBuf::from("dist.y4m"));
        assert_eq!(settings.features, vec!["psnr"]);
        assert_eq!(settings.threads, 2);
        assert!(settings.version);
    }

    #[test]
    fn test_models_keep_order_when_interleaved() {
        let args = [
            "-m", "a", "-r", "ref.y4m", "-m", "b", "-f", "ssim", "-d", "dist.y4m", "-m", "c",
        ];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(
            settings.models,
            vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
        assert_eq!(settings.features, vec!["ssim"]);
    }

    #[test]
    fn test_last_single_value_wins() {
        let args = with_base(&["-r", "other.y4m", "-t", "1", "-t", "6"]);
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.reference, PathBuf::from("other.y4m"));
        assert_eq!(settings.threads, 6);
    }

    #[test]
    fn test_threads_values() {
        assert_eq!(try_parse_from(with_base(&["-t", "8"])).unwrap().threads, 8);
        assert_eq!(try_parse_from(with_base(&["-t", "0"])).unwrap().threads, 0);
        assert_eq!(try_parse_from(with_base(&["-t0x10"])).unwrap().threads, 16);
        assert_eq!(try_parse_from(with_base(&[])).unwrap().threads, 0);
    }

    #[test]
    fn test_threads_invalid() {
        let err = try_parse_from(with_base(&["--threads", "abc"])).unwrap_err();
        assert_eq!(err.option().map(|spec| spec.short), Some('t'));
        assert_eq!(
            err.to_string(),
            "Invalid argument \"abc\" for option -t/--threads; should be an integer"
        );
    }

    #[test]
    fn test_exactly_max_models_and_features() {
        let mut extra = Vec::new();
        for i in 1..MAX_MODELS {
            extra.push("-m".to_string());
            extra.push(format!("model{i}.json"));
        }
        for i in 0..MAX_FEATURES {
            extra.push("-f".to_string());
            extra.push(format!("feature{i}"));
        }
        let mut args = with_base(&[]);
        args.extend(extra);
        let settings = try_parse_from(&args).unwrap();
        assert_eq!(settings.models.len(), MAX_MODELS);
        assert_eq!(settings.features.len(), MAX_FEATURES);

        args.push("--model".to_string());
        args.push("overflow.json".to_string());
        let err = try_parse_from(&args).unwrap_err();
        assert_eq!(err.to_string(), format!("A maximum of {} models is supported", MAX_MODELS));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(try_parse_from(["-r", "ref.y4m"]), Err(CliError::MissingDistorted));
        assert_eq!(
            try_parse_from(["-d", "dist.y4m", "-m", "m.json"]),
            Err(CliError::MissingReference)
        );
        assert_eq!(
            try_parse_from(["-r", "ref.y4m", "-d", "dist.y4m"]),
            Err(CliError::MissingModel)
        );
        assert_eq!(try_parse_from(Vec::<String>::new()), Err(CliError::MissingReference));
    }

    #[test]
    fn test_unrecognized_tokens_are_skipped() {
        let args = with_base(&["--frobnicate", "stray", "-x", "-", "--verbose=1"]);
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.models.len(), 1);
        assert!(!settings.version);
    }

    #[test]
    fn test_attached_values_and_clusters() {
        let args = ["-rref.y4m", "-vd", "dist.y4m", "-mm.json", "-fvif"];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.reference, PathBuf::from("ref.y4m"));
        assert_eq!(settings.distorted, PathBuf::from("dist.y4m"));
        assert_eq!(settings.models, vec![PathBuf::from("m.json")]);
        assert_eq!(settings.features, vec!["vif"]);
        assert!(settings.version);
    }

    #[test]
    fn test_abbreviated_long_options() {
        let args = ["--ref", "ref.y4m", "--dist", "dist.y4m", "--mod", "m.json", "--thr=3"];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.reference, PathBuf::from("ref.y4m"));
        assert_eq!(settings.threads, 3);
    }

    #[test]
    fn test_value_is_taken_verbatim() {
        let settings = try_parse_from(with_base(&["-f", "-weird-name"])).unwrap();
        assert_eq!(settings.features, vec!["-weird-name"]);
    }

    #[test]
    fn test_double_dash_ends_options() {
        let args = ["-r", "ref.y4m", "-d", "dist.y4m", "--", "-m", "m.json"];
        let err = try_parse_from(args).unwrap_err();
        assert_eq!(err, CliError::MissingModel);
    }

    #[test]
    fn test_trailing_option_without_value_is_skipped() {
        let settings = try_parse_from(with_base(&["-t"])).unwrap();
        assert_eq!(settings.threads, 0);
    }

    #[test]
    fn test_flag_with_inline_value_is_skipped() {
        let settings = try_parse_from(with_base(&["--version=yes"])).unwrap();
        assert!(!settings.version);
    }

    #[test]
    fn test_usage_lists_every_option() {
        let text = usage("vmaf");
        assert!(text.starts_with("Usage: vmaf [options]\n\nSupported options:\n"));
        assert!(text.contains(" --reference/-r $string:    path to reference .y4m\n"));
        assert!(text.contains(" --model/-m $model:         path to model file\n"));
        assert!(text.contains(" --version/-v:              print version and exit\n"));
        for spec in OPTIONS {
            assert!(text.contains(&format!("--{}/-{}", spec.long, spec.short)));
        }
    }

    #[test]
    fn test_render_failure_puts_reason_first() {
        let text = render_failure("vmaf", &CliError::MissingModel);
        assert!(
            text.starts_with("At least one model file (-m/--model) is required\n\nUsage: vmaf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let args = [
            OsStr::new("-r"),
            OsStr::from_bytes(b"ref\xff.y4m"),
            OsStr::new("--distorted"),
            OsStr::from_bytes(b"dist\xfe.y4m"),
            OsStr::new("-m"),
            OsStr::from_bytes(b"m\xff.json"),
        ];
        let settings = try_parse_from(args).unwrap();
        assert_eq!(settings.reference.as_os_str().as_bytes(), b"ref\xff.y4m");
        assert_eq!(settings.distorted.as_os_str().as_bytes(), b"dist\xfe.y4m");
        assert_eq!(settings.models[0].as_os_str().as_bytes(), b"m\xff.json");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_attached_value_is_rejected() {
        use std::os::unix::ffi::OsStrExt;

        for token in [&b"-rref\xff.y4m"[..], &b"--reference=ref\xff.y4m"[..]] {
            let args = [
                OsStr::from_bytes(token),
                OsStr::new("-d"),
                OsStr::new("dist.y4m"),
                OsStr::new("-m"),
                OsStr::new("m.json"),
            ];
            let err = try_parse_from(args).unwrap_err();
            assert_eq!(err.option().map(|spec| spec.short), Some('r'));
            assert!(err.to_string().ends_with("should be valid UTF-8 when attached to the option"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_threads_and_features_are_invalid() {
        use std::os::unix::ffi::OsStrExt;

        let base: Vec<&OsStr> = BASE.iter().map(|arg| OsStr::new(*arg)).collect();

        let mut args = base.clone();
        args.extend([OsStr::new("-t"), OsStr::from_bytes(b"4\xff")]);
        let err = try_parse_from(args).unwrap_err();
        assert_eq!(err.option().map(|spec| spec.short), Some('t'));
        assert!(err.to_string().ends_with("should be an integer"));

        let mut args = base;
        args.extend([OsStr::new("--feature"), OsStr::from_bytes(b"vif\xff")]);
        let err = try_parse_from(args).unwrap_err();
        assert_eq!(err.option().map(|spec| spec.short), Some('f'));
        assert!(err.to_string().ends_with("should be a UTF-8 string"));
    }
}
