//! Console rendering for interactive runs and JSON printing.
//!
//! Colors come from `owo-colors` and are disabled for JSON output or when
//! `NO_COLOR` is set. Line composition is pure so it can be tested without
//! a terminal.

use crate::orchestrator::{ExitPolicy, Narrator, StatusCounts};
use crate::registry::Registry;
use crate::result::{CheckResult, Status};
use crate::stac::{STAC_CHECKS, STAC_SUITE};
use owo_colors::OwoColorize;
use regex::Regex;
use serde_json::Value as JsonVal;
use std::sync::OnceLock;

pub const BANNER: &str = r"
  __|   _` |   __|   _` |   __|
 |     (   | \__ \  (   |  (
_|    \__._| ____/ \__. | \___|
                       _|
";

pub fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix(color: bool) -> String {
    if color {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// Status token as printed after a checker name.
pub fn status_label(status: Status, color: bool) -> String {
    let text = status.as_str().to_uppercase();
    if !color {
        return text;
    }
    match status {
        Status::Ok => text.green().bold().to_string(),
        Status::Warning => text.yellow().bold().to_string(),
        Status::Error => text.red().bold().to_string(),
        Status::Note => text.blue().bold().to_string(),
        Status::Skipped => text.dimmed().to_string(),
    }
}

fn quoted() -> Option<&'static Regex> {
    static QUOTED: OnceLock<Option<Regex>> = OnceLock::new();
    QUOTED.get_or_init(|| Regex::new(r"'(.*?)'").ok()).as_ref()
}

/// Emphasize single-quoted fragments such as offending values.
pub fn highlight_quoted(text: &str, color: bool) -> String {
    match (color, quoted()) {
        (true, Some(re)) => re
            .replace_all(text, |caps: &regex::Captures<'_>| {
                (&caps[0]).cyan().bold().to_string()
            })
            .into_owned(),
        _ => text.to_string(),
    }
}

/// Lines printed for one finished checker.
///
/// A single result goes on the name line; several results get one indented
/// line each, prefixed with their file.
pub fn checker_lines(name: &str, results: &[CheckResult], color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    match results {
        [] => lines.push(format!("- {}: no applicable files", name)),
        [one] => {
            lines.push(format!("- {}: {}", name, status_label(one.status, color)));
            if let Some(detail) = detail_of(one) {
                lines.push(format!("    {}", highlight_quoted(&detail, color)));
            }
        }
        many => {
            lines.push(format!("- {}:", name));
            for r in many {
                let files = r.target.files().join(", ");
                lines.push(format!("    {} {}", status_label(r.status, color), files));
                if let Some(detail) = detail_of(r) {
                    lines.push(format!("        {}", highlight_quoted(&detail, color)));
                }
            }
        }
    }
    lines
}

// OK results are quiet unless they carry a message worth showing.
fn detail_of(r: &CheckResult) -> Option<String> {
    let m = r.message.as_ref()?;
    match r.status {
        Status::Ok if r.spatial_flags.is_none() => None,
        _ => Some(m.render()),
    }
}

/// Narrator for interactive runs.
pub struct ConsoleNarrator {
    pub color: bool,
}

impl Narrator for ConsoleNarrator {
    fn checker_finished(&mut self, checker_name: &str, results: &[CheckResult]) {
        for line in checker_lines(checker_name, results, self.color) {
            println!("{}", line);
        }
    }
}

pub fn print_header(model: &str, suite: &str, timestamp: &str, color: bool) {
    println!("{}", BANNER.trim_matches('\n'));
    let field = |label: &str, value: &str| {
        if color {
            println!("{}: {}", label.bold(), value.bright_blue());
        } else {
            println!("{}: {}", label, value);
        }
    };
    field("HEC-RAS Model", model);
    field("Checksuite", suite);
    field("Timestamp", timestamp);
    if color {
        println!("{}:", "Checks".bold());
    } else {
        println!("Checks:");
    }
}

pub fn summary_lines(counts: &StatusCounts, color: bool) -> Vec<String> {
    let paint = |n: usize, status: Status| {
        if color {
            match status {
                Status::Error => n.red().bold().to_string(),
                Status::Warning => n.yellow().bold().to_string(),
                Status::Ok => n.green().bold().to_string(),
                _ => n.bold().to_string(),
            }
        } else {
            n.to_string()
        }
    };
    let mut lines = vec![
        "Results:".to_string(),
        format!("- Errors: {}", paint(counts.error, Status::Error)),
        format!("- Warnings: {}", paint(counts.warning, Status::Warning)),
        format!("- OK: {}", paint(counts.ok, Status::Ok)),
        format!("- Notes: {}", paint(counts.note, Status::Note)),
    ];
    if counts.skipped > 0 {
        lines.push(format!("- Skipped: {}", paint(counts.skipped, Status::Skipped)));
    }
    let verdict = match (counts.exit_policy(), color) {
        (ExitPolicy::Failed, true) => format!("✖ Finished with {}.", "errors".red().bold()),
        (ExitPolicy::Failed, false) => "✖ Finished with errors.".to_string(),
        (ExitPolicy::PassedWithWarnings, true) => {
            format!("▲ Finished with {}.", "warnings".yellow().bold())
        }
        (ExitPolicy::PassedWithWarnings, false) => "▲ Finished with warnings.".to_string(),
        (ExitPolicy::Passed, _) => "✔ All checks passed.".to_string(),
    };
    lines.push(verdict);
    lines
}

pub fn print_summary(counts: &StatusCounts, color: bool) {
    for line in summary_lines(counts, color) {
        println!("{}", line);
    }
}

/// Pretty JSON on stdout.
pub fn print_json(doc: &JsonVal) {
    match serde_json::to_string_pretty(doc) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", error_prefix(false), e),
    }
}

/// `--list`: every suite with its checkers and their dependencies.
pub fn print_suites(registry: &Registry, color: bool) {
    for suite in registry.suites() {
        if color {
            println!("{}", suite.name().as_str().bold());
        } else {
            println!("{}", suite.name());
        }
        for e in suite.entries() {
            if e.dependencies.is_empty() {
                println!("  {} ({})", e.checker.id(), e.checker.name());
            } else {
                println!(
                    "  {} ({}) <- {}",
                    e.checker.id(),
                    e.checker.name(),
                    e.dependencies.join(", ")
                );
            }
        }
    }
    if color {
        println!("{}", STAC_SUITE.bold());
    } else {
        println!("{}", STAC_SUITE);
    }
    for c in &STAC_CHECKS {
        println!("  {} ({}) [{}]", c.id, c.name, c.property);
    }
}
