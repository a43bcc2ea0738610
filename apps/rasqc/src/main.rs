//! rasqc CLI binary entry point.
//! Resolves configuration, builds the registry and runs one suite.

use clap::Parser;
use rasqc::cli::Cli;
use rasqc::config::{self, CliOverrides};
use rasqc::model::{find_project, RasModel};
use rasqc::orchestrator::{run_suite, run_suite_silent, RunOptions, RunReport, Silent};
use rasqc::output::{self, ConsoleNarrator};
use rasqc::registry::Registry;
use rasqc::report::{self, ColorTheme};
use rasqc::schema::{ConventionSchema, SchemaSource};
use rasqc::stac::{self, StacItem, STAC_SUITE};
use rasqc::summary;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn fail(color: bool, message: impl std::fmt::Display) -> i32 {
    eprintln!("{} {}", output::error_prefix(color), message);
    2
}

fn run(cli: Cli) -> i32 {
    // A directory argument is resolved to the project file it holds.
    let prj = match cli.ras_model.as_deref().map(PathBuf::from) {
        Some(p) if p.is_dir() => match find_project(&p) {
            Ok(found) => Some(found),
            Err(e) => return fail(output::use_colors("human"), e),
        },
        other => other,
    };
    let model_dir = prj
        .as_deref()
        .or(cli.stac.as_deref().map(Path::new))
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let overrides = CliOverrides {
        checksuite: cli.checksuite.as_deref(),
        output: cli.json.then_some("json"),
        theme: cli.theme.as_deref(),
        schema: cli.schema.as_deref(),
        timeout_ms: cli.timeout_ms,
        parallel: cli.parallel.then_some(true),
        out_dir: cli.out_dir.as_deref(),
    };
    let eff = config::resolve_effective(&model_dir, &overrides);
    let color = output::use_colors(&eff.output);
    if !eff.config_found {
        log::debug!("no rasqc.toml found under {}; using defaults", eff.root.display());
    }

    let source = match eff.schema.parse::<SchemaSource>() {
        Ok(s) => s,
        Err(never) => match never {},
    };
    let schema = match ConventionSchema::load(&source).and_then(|s| s.self_test().map(|_| s)) {
        Ok(s) => Arc::new(s),
        Err(e) => return fail(color, e),
    };
    let registry = match Registry::with_builtins(schema) {
        Ok(r) => r,
        Err(e) => return fail(color, e),
    };
    if cli.list {
        output::print_suites(&registry, color);
        return 0;
    }
    if let Some(item) = cli.stac.as_deref() {
        return run_stac_item(Path::new(item), registry.schema(), &eff.output, cli.summary.as_deref(), color);
    }
    let suite = match registry.get(&eff.checksuite) {
        Ok(s) => s,
        Err(e) => return fail(color, e),
    };
    let theme = match eff.theme.parse::<ColorTheme>() {
        Ok(t) => t,
        Err(e) => return fail(color, e),
    };

    let Some(prj) = prj else {
        return fail(color, "no HEC-RAS model given");
    };
    let model = match RasModel::open(&prj) {
        Ok(m) => Arc::new(m),
        Err(e) => return fail(color, e),
    };
    let opts = RunOptions {
        timeout: eff.timeout,
        parallel: eff.parallel,
    };
    let timestamp = chrono::Utc::now().to_rfc3339();
    let model_label = prj.to_string_lossy().to_string();

    let outcome = if eff.output == "json" {
        let rep = run_suite_silent(&model, suite, &opts);
        output::print_json(&report::compose_report_json(
            &model_label,
            suite.name().as_str(),
            &timestamp,
            &rep.results,
        ));
        rep
    } else if cli.files {
        println!("{}", output::BANNER.trim_matches('\n'));
        let rep = run_suite_silent(&model, suite, &opts);
        match report::write_files(&eff.out_dir, &model, suite.name(), &rep.results, theme, &timestamp) {
            Ok(written) => {
                println!("HTML log: {}", written.html_log.display());
                for layer in &written.layers {
                    println!("Layer: {}", layer.display());
                }
                println!("Summary: {}", written.workbook.display());
            }
            Err(e) => return fail(color, e),
        }
        rep
    } else {
        output::print_header(&model_label, suite.name().as_str(), &timestamp, color);
        let mut narrator = ConsoleNarrator { color };
        let rep = run_suite(&model, suite, &opts, &mut narrator);
        output::print_summary(&rep.counts, color);
        rep
    };

    finish(&outcome, cli.summary.as_deref(), color)
}

fn run_stac_item(
    path: &Path,
    schema: &ConventionSchema,
    output_mode: &str,
    summary_path: Option<&str>,
    color: bool,
) -> i32 {
    if let Err(e) = stac::verify_schema(schema) {
        return fail(color, e);
    }
    let item = match StacItem::open(path) {
        Ok(i) => i,
        Err(e) => return fail(color, e),
    };
    let timestamp = chrono::Utc::now().to_rfc3339();
    let label = path.to_string_lossy().to_string();
    let outcome = if output_mode == "json" {
        let rep = stac::run_stac(schema, &item, &mut Silent);
        output::print_json(&report::compose_report_json(&label, STAC_SUITE, &timestamp, &rep.results));
        rep
    } else {
        output::print_header(&label, STAC_SUITE, &timestamp, color);
        let rep = stac::run_stac(schema, &item, &mut ConsoleNarrator { color });
        output::print_summary(&rep.counts, color);
        rep
    };
    finish(&outcome, summary_path, color)
}

// Optional summary export, then the exit code of the run.
fn finish(outcome: &RunReport, summary_path: Option<&str>, color: bool) -> i32 {
    if let Some(path) = summary_path.map(PathBuf::from) {
        let grouped = summary::summarize(&outcome.results);
        let written = summary::to_json_file(&grouped, &path)
            .and_then(|_| summary::to_workbook(&grouped, &path.with_extension("xlsx")));
        if let Err(e) = written {
            return fail(color, e);
        }
    }
    outcome.counts.exit_policy().exit_code()
}
