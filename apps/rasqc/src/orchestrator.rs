//! Suite execution against one model.
//!
//! Checkers run in registration order. Before each checker its dependency
//! gate is consulted: every dependency must have run in this invocation and
//! produced no ERROR result, otherwise the checker is reported as SKIPPED in
//! its own position. A checker that returns `Err`, panics or exceeds the
//! configured timeout is replaced by a single synthetic ERROR result and the
//! suite continues.
//!
//! In parallel mode the dependency-free checkers are evaluated up front on
//! the rayon pool; gated checkers are evaluated afterwards in order. The
//! output sequence and narration always follow registration order, so both
//! modes yield the same results.

use crate::checker::Checker;
use crate::model::RasModel;
use crate::registry::{CheckSuite, SuiteEntry};
use crate::result::{CheckResult, Status};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
/// Execution knobs.
pub struct RunOptions {
    /// Per-checker wall-clock limit. `None` disables the guard.
    pub timeout: Option<Duration>,
    pub parallel: bool,
}

/// Receives per-checker dispositions as the run progresses.
pub trait Narrator {
    fn checker_finished(&mut self, checker_name: &str, results: &[CheckResult]);
}

/// Narrator for batch runs: prints nothing.
pub struct Silent;

impl Narrator for Silent {
    fn checker_finished(&mut self, _checker_name: &str, _results: &[CheckResult]) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Result counts per status.
pub struct StatusCounts {
    pub ok: usize,
    pub warning: usize,
    pub error: usize,
    pub note: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut c = StatusCounts::default();
        for r in results {
            match r.status {
                Status::Ok => c.ok += 1,
                Status::Warning => c.warning += 1,
                Status::Error => c.error += 1,
                Status::Note => c.note += 1,
                Status::Skipped => c.skipped += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.ok + self.warning + self.error + self.note + self.skipped
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        if self.error > 0 {
            ExitPolicy::Failed
        } else if self.warning > 0 {
            ExitPolicy::PassedWithWarnings
        } else {
            ExitPolicy::Passed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Process-level outcome. NOTE and SKIPPED never affect it.
pub enum ExitPolicy {
    Passed,
    PassedWithWarnings,
    Failed,
}

impl ExitPolicy {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitPolicy::Failed => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
/// Ordered results of one suite run.
pub struct RunReport {
    pub results: Vec<CheckResult>,
    pub counts: StatusCounts,
}

/// Run `suite` against `model`, reporting each checker to `narrator`.
pub fn run_suite(
    model: &Arc<RasModel>,
    suite: &CheckSuite,
    opts: &RunOptions,
    narrator: &mut dyn Narrator,
) -> RunReport {
    let started = Instant::now();
    let entries = suite.entries();
    log::info!(
        "running suite '{}' ({} checkers) on {}",
        suite.name(),
        entries.len(),
        model.project.filename()
    );

    let mut precomputed: Vec<Option<Vec<CheckResult>>> = if opts.parallel {
        entries
            .par_iter()
            .map(|e| {
                e.dependencies
                    .is_empty()
                    .then(|| evaluate_isolated(&e.checker, model, opts.timeout))
            })
            .collect()
    } else {
        vec![None; entries.len()]
    };

    let mut passed: HashMap<&str, bool> = HashMap::new();
    let mut results: Vec<CheckResult> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let checker = &entry.checker;
        let produced = match precomputed[i].take() {
            Some(done) => done,
            None => match unmet_dependencies(entry, &passed) {
                Some(unmet) => vec![skipped(checker.as_ref(), model, &unmet)],
                None => evaluate_isolated(checker, model, opts.timeout),
            },
        };
        let ok = produced
            .iter()
            .all(|r| !matches!(r.status, Status::Error | Status::Skipped));
        passed.insert(checker.id(), ok);
        for r in produced.iter().filter(|r| !r.is_parallel()) {
            log::warn!(
                "checker '{}' returned a list message whose length differs from its target list",
                r.rule_name
            );
        }
        narrator.checker_finished(checker.name(), &produced);
        results.extend(produced);
    }

    let counts = StatusCounts::from_results(&results);
    log::info!(
        "suite '{}' finished in {} ms: ok={} warning={} error={} note={} skipped={}",
        suite.name(),
        started.elapsed().as_millis(),
        counts.ok,
        counts.warning,
        counts.error,
        counts.note,
        counts.skipped
    );
    RunReport { results, counts }
}

/// Batch form of `run_suite`: identical traversal, no narration.
pub fn run_suite_silent(model: &Arc<RasModel>, suite: &CheckSuite, opts: &RunOptions) -> RunReport {
    run_suite(model, suite, opts, &mut Silent)
}

fn unmet_dependencies(entry: &SuiteEntry, passed: &HashMap<&str, bool>) -> Option<Vec<String>> {
    let unmet: Vec<String> = entry
        .dependencies
        .iter()
        .filter(|d| !passed.get(d.as_str()).copied().unwrap_or(false))
        .cloned()
        .collect();
    (!unmet.is_empty()).then_some(unmet)
}

fn skipped(checker: &dyn Checker, model: &RasModel, unmet: &[String]) -> CheckResult {
    log::info!(
        "skipping '{}': dependency not satisfied ({})",
        checker.id(),
        unmet.join(", ")
    );
    let quoted: Vec<String> = unmet.iter().map(|d| format!("'{}'", d)).collect();
    CheckResult::new(Status::Skipped, checker.name(), model.project.filename()).with_message(
        format!("Skipped: dependency {} did not pass.", quoted.join(", ")),
    )
}

fn fault(checker_name: &str, model: &RasModel, detail: &str) -> CheckResult {
    CheckResult::error(
        checker_name,
        model.project.filename(),
        format!("Checker '{}' failed: {}", checker_name, detail),
    )
}

fn evaluate_isolated(
    checker: &Arc<dyn Checker>,
    model: &Arc<RasModel>,
    timeout: Option<Duration>,
) -> Vec<CheckResult> {
    let Some(limit) = timeout else {
        return evaluate_guarded(checker.as_ref(), model);
    };
    let (tx, rx) = mpsc::channel();
    let worker_checker = Arc::clone(checker);
    let worker_model = Arc::clone(model);
    let spawned = thread::Builder::new()
        .name(format!("rasqc-{}", checker.id()))
        .spawn(move || {
            let out = evaluate_guarded(worker_checker.as_ref(), &worker_model);
            let _ = tx.send(out);
        });
    if let Err(e) = spawned {
        return vec![fault(checker.name(), model, &format!("could not start worker: {}", e))];
    }
    match rx.recv_timeout(limit) {
        Ok(out) => out,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            // The worker is detached; it finishes in the background.
            log::warn!("checker '{}' timed out after {} ms", checker.id(), limit.as_millis());
            vec![fault(
                checker.name(),
                model,
                &format!("timed out after {} ms", limit.as_millis()),
            )]
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            vec![fault(checker.name(), model, "worker exited without a result")]
        }
    }
}

fn evaluate_guarded(checker: &dyn Checker, model: &RasModel) -> Vec<CheckResult> {
    log::debug!("evaluating '{}'", checker.id());
    match catch_unwind(AssertUnwindSafe(|| checker.evaluate(model))) {
        Ok(Ok(eval)) => eval.into_results(),
        Ok(Err(e)) => {
            log::warn!("checker '{}' returned an error: {}", checker.id(), e);
            vec![fault(checker.name(), model, &e.to_string())]
        }
        Err(payload) => {
            let text = panic_payload_to_string(payload.as_ref());
            log::error!("checker '{}' panicked: {}", checker.id(), text);
            vec![fault(checker.name(), model, &format!("panicked: {}", text))]
        }
    }
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
