//! Contract every validation rule implements.
//!
//! A checker is a stateless value holding only configuration fixed at
//! construction. Expected absence (a missing HDF file, a missing optional
//! attribute) is reported as a WARNING or NOTE result; `Err` is reserved for
//! faults, which the orchestrator isolates per checker.

use crate::model::RasModel;
use crate::result::CheckResult;
use thiserror::Error;

/// Either one model-wide result or one result per sub-element.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    One(CheckResult),
    Many(Vec<CheckResult>),
}

impl Evaluation {
    /// Flatten to the list form consumed by aggregation.
    pub fn into_results(self) -> Vec<CheckResult> {
        match self {
            Evaluation::One(r) => vec![r],
            Evaluation::Many(rs) => rs,
        }
    }
}

impl From<CheckResult> for Evaluation {
    fn from(r: CheckResult) -> Self {
        Evaluation::One(r)
    }
}

impl From<Vec<CheckResult>> for Evaluation {
    fn from(rs: Vec<CheckResult>) -> Self {
        Evaluation::Many(rs)
    }
}

/// Unexpected fault inside a checker.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("attribute '{key}' has unexpected shape in {file}: {found}")]
    UnexpectedValue {
        file: String,
        key: String,
        found: String,
    },

    #[error("convention schema property '{0}' is not loaded")]
    MissingSchemaProperty(String),

    #[error("{0}")]
    Other(String),
}

/// A registered rule.
pub trait Checker: Send + Sync {
    /// Stable identifier used for dependency declarations.
    fn id(&self) -> &'static str;

    /// Display name, used as `rule_name` on every result.
    fn name(&self) -> &'static str;

    /// Convention schema properties this checker looks up.
    fn required_properties(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Status;

    #[test]
    fn test_single_result_flattens_to_singleton() {
        let ev: Evaluation = CheckResult::ok("r", "a.prj").into();
        assert_eq!(ev.into_results().len(), 1);
    }

    #[test]
    fn test_many_results_keep_order() {
        let ev: Evaluation = vec![
            CheckResult::ok("r", "a.p01.hdf"),
            CheckResult::warning("r", "a.p02.hdf", "missing"),
        ]
        .into();
        let rs = ev.into_results();
        assert_eq!(rs[0].status, Status::Ok);
        assert_eq!(rs[1].target.files(), vec!["a.p02.hdf"]);
    }
}
