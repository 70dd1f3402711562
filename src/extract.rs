//! Parsers turning configure output into a [`FeatureRecord`].
//!
//! Two textual forms are understood:
//!
//! * the console summary CMake prints at the end of configuration, where the
//!   CPU block sits between a `CPU/HW features:` header and the `C/C++:`
//!   header that follows it;
//! * a variable dump (`NAME=value` or CMake cache style `NAME:TYPE=value`).
//!
//! Neither parser fails. A field whose marker is missing comes back empty and
//! the comparison stage decides whether that matters.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{HarnessError, Result};
use crate::record::{FeatureList, FeatureRecord, Requested};

/// Marker opening the CPU block in the configure summary.
pub const SECTION_BEGIN: &str = "CPU/HW features:";

/// Marker of the block following the CPU block.
pub const SECTION_END: &str = "C/C++:";

/// A parsed record along with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub record: FeatureRecord,
    /// The slice of output the record was parsed from, for diagnostics.
    pub raw: String,
}

/// Where a case reads its features from after a successful configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSource {
    /// Captured standard output.
    Console,
    /// A key=value file written into the working directory.
    VarFile { file_name: String, names: VarNames },
}

impl OutputSource {
    pub fn var_file(file_name: impl Into<String>) -> Self {
        OutputSource::VarFile {
            file_name: file_name.into(),
            names: VarNames::default(),
        }
    }
}

/// Variable names holding each record field in a dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarNames {
    pub baseline: String,
    pub requested: String,
    pub disabled: String,
    pub dispatched: String,
}

impl Default for VarNames {
    fn default() -> Self {
        VarNames {
            baseline: "CPU_BASELINE_FINAL".into(),
            requested: "CPU_BASELINE".into(),
            disabled: "CPU_BASELINE_DISABLE".into(),
            dispatched: "CPU_DISPATCH_FINAL".into(),
        }
    }
}

fn summary_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*--\s+(?P<key>Baseline|requested|disabled|Dispatched code generation):[ \t]*(?P<value>.*?)\s*$",
        )
        .expect("summary line pattern is valid")
    })
}

fn var_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::[A-Za-z_]+)?=(?P<value>.*)$")
            .expect("variable line pattern is valid")
    })
}

/// Lines strictly between the begin marker and the following end marker.
fn cpu_section(stdout: &str) -> Vec<&str> {
    let mut lines = stdout.lines();
    if !lines.any(|l| l.contains(SECTION_BEGIN)) {
        return Vec::new();
    }
    lines.take_while(|l| !l.contains(SECTION_END)).collect()
}

/// Extract the feature record from configure console output.
pub fn parse_console(stdout: &str) -> Extracted {
    let section = cpu_section(stdout);
    let re = summary_line();

    let entries: Vec<(&str, &str)> = section
        .iter()
        .map(|line| match re.captures(line) {
            Some(c) => (
                c.name("key").map_or("", |m| m.as_str()),
                c.name("value").map_or("", |m| m.as_str()),
            ),
            None => ("", ""),
        })
        .collect();

    let first = |key: &str| {
        entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or("")
    };

    // An empty dispatch summary is followed by its own `requested:` line.
    let dispatched = match entries
        .iter()
        .position(|(k, _)| *k == "Dispatched code generation")
    {
        Some(i) if entries[i].1.is_empty() => match entries.get(i + 1) {
            Some(("requested", v)) => *v,
            _ => "",
        },
        Some(i) => entries[i].1,
        None => "",
    };

    let record = FeatureRecord {
        baseline: FeatureList::parse(first("Baseline")),
        requested: Requested::parse(first("requested")),
        disabled: FeatureList::parse(first("disabled")),
        dispatched: FeatureList::parse(dispatched),
    };
    log::trace!("parsed console record {record}");

    Extracted {
        record,
        raw: section.join("\n"),
    }
}

/// Extract the feature record from a variable dump.
pub fn parse_var_file(contents: &str, names: &VarNames) -> Extracted {
    let re = var_line();
    let vars: Vec<(&str, &str)> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("//"))
        .filter_map(|l| {
            re.captures(l).map(|c| {
                (
                    c.name("name").map_or("", |m| m.as_str()),
                    c.name("value").map_or("", |m| m.as_str()),
                )
            })
        })
        .collect();

    let lookup = |name: &str| {
        vars.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap_or("")
    };

    let record = FeatureRecord {
        baseline: FeatureList::parse(lookup(&names.baseline)),
        requested: Requested::parse(lookup(&names.requested)),
        disabled: FeatureList::parse(lookup(&names.disabled)),
        dispatched: FeatureList::parse(lookup(&names.dispatched)),
    };
    log::trace!("parsed variable record {record}");

    Extracted {
        record,
        raw: contents.to_string(),
    }
}

/// Read and parse a variable dump from disk.
pub fn read_var_file(path: &Path, names: &VarNames) -> Result<Extracted> {
    if !path.exists() {
        return Err(HarnessError::MissingArtifact(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(parse_var_file(&contents, names))
}
