// src/options.rs

use std::fmt;

/// Which settings field an option writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Reference,
    Distorted,
    Model,
    Threads,
    Feature,
    Version,
}

/// One row of the option table.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionSpec {
    pub short: char,
    pub long: &'static str,
    /// Placeholder shown in the usage text; `None` for flags that take no value.
    pub value: Option<&'static str>,
    pub help: &'static str,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn takes_value(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}/--{}", self.short, self.long)
    }
}

pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        short: 'r',
        long: "reference",
        value: Some("$string"),
        help: "path to reference .y4m",
        kind: OptionKind::Reference,
    },
    OptionSpec {
        short: 'd',
        long: "distorted",
        value: Some("$string"),
        help: "path to distorted .y4m",
        kind: OptionKind::Distorted,
    },
    OptionSpec {
        short: 'm',
        long: "model",
        value: Some("$model"),
        help: "path to model file",
        kind: OptionKind::Model,
    },
    OptionSpec {
        short: 't',
        long: "threads",
        value: Some("$unsigned"),
        help: "number of threads to use",
        kind: OptionKind::Threads,
    },
    OptionSpec {
        short: 'f',
        long: "feature",
        value: Some("$string"),
        help: "additional feature",
        kind: OptionKind::Feature,
    },
    OptionSpec {
        short: 'v',
        long: "version",
        value: None,
        help: "print version and exit",
        kind: OptionKind::Version,
    },
];

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// No two rows may share a short or long form, and every long form must be non-empty.
pub const fn table_is_consistent(table: &[OptionSpec]) -> bool {
    let mut i = 0;
    while i < table.len() {
        if table[i].long.is_empty() || table[i].short == '-' {
            return false;
        }
        let mut j = i + 1;
        while j < table.len() {
            if table[i].short == table[j].short || str_eq(table[i].long, table[j].long) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(table_is_consistent(OPTIONS), "option table has duplicate forms");

/// Result of resolving a `--name` token against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongMatch {
    Found(&'static OptionSpec),
    Ambiguous,
    Unknown,
}

pub fn find_short(c: char) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.short == c)
}

/// Looks up a long option, accepting any unambiguous prefix. An exact match always wins.
pub fn find_long(name: &str) -> LongMatch {
    if name.is_empty() {
        return LongMatch::Unknown;
    }
    if let Some(spec) = OPTIONS.iter().find(|spec| spec.long == name) {
        return LongMatch::Found(spec);
    }

    let mut candidates = OPTIONS.iter().filter(|spec| spec.long.starts_with(name));
    match (candidates.next(), candidates.next()) {
        (Some(spec), None) => LongMatch::Found(spec),
        (Some(_), Some(_)) => LongMatch::Ambiguous,
        _ => LongMatch::Unknown,
    }
}
