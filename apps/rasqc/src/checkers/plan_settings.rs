//! Plan parameter checks read from plan HDF attributes.

use super::as_list;
use crate::checker::{CheckError, Checker, Evaluation};
use crate::model::{groups, RasModel};
use crate::result::{CheckResult, MessageItem, Status};
use serde_json::{Map, Value as Json};

const EXPECTED_EQUATION_SET: &str = "Diffusion Wave";

/// Every 2D area of every computed plan must use the diffusion wave
/// equations.
pub struct EquationSet2D;

impl Checker for EquationSet2D {
    fn id(&self) -> &'static str {
        "EquationSet2D"
    }
    fn name(&self) -> &'static str {
        "2D Equation Set"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::new();
        for plan in &model.plans {
            let Some(hdf) = plan.file.hdf.as_ref() else {
                continue;
            };
            let file = plan.file.hdf_filename();
            let Some(value) = hdf.attr(groups::PLAN_PARAMETERS, "2D Equation Set") else {
                out.push(CheckResult::warning(
                    self.name(),
                    file,
                    "2D Equation Set is not recorded in the plan parameters.",
                ));
                continue;
            };
            for set in as_list(value, &file, "2D Equation Set")? {
                let set = match set {
                    Json::String(s) => s,
                    other => other.to_string(),
                };
                if set == EXPECTED_EQUATION_SET {
                    out.push(CheckResult::ok(self.name(), file.as_str()));
                } else {
                    out.push(CheckResult::warning(
                        self.name(),
                        file.as_str(),
                        format!(
                            "2D Equation Set '{}' does not match expected setting: '{}'.",
                            set, EXPECTED_EQUATION_SET
                        ),
                    ));
                }
            }
        }
        Ok(out.into())
    }
}

/// Computation time-step settings for review, one entry per plan.
pub struct ComputationSettings;

impl ComputationSettings {
    const SETTINGS: [&'static str; 8] = [
        "Computation Time Step Base",
        "Computation Time Courant Method",
        "Computation Time Step Max Courant",
        "Computation Time Step Min Courant",
        "Computation Time Step Count To Double",
        "Computation Time Step Max Doubling",
        "Computation Time Step Max Halving",
        "Time Window",
    ];
}

impl Checker for ComputationSettings {
    fn id(&self) -> &'static str {
        "ComputationSettings"
    }
    fn name(&self) -> &'static str {
        "Computation Settings"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let entries = model
            .plans
            .iter()
            .map(|plan| {
                let file = plan.file.hdf_filename();
                let item = match plan.file.hdf.as_ref() {
                    None => MessageItem::Text(format!(
                        "{} does not exist within the specified directory",
                        file
                    )),
                    Some(hdf) => {
                        let mut found = Map::new();
                        for key in Self::SETTINGS {
                            if let Some(v) = hdf.attr(groups::PLAN_INFORMATION, key) {
                                found.insert(key.to_lowercase(), v.clone());
                            }
                        }
                        MessageItem::Structured(found)
                    }
                };
                (file, item)
            })
            .collect();
        Ok(CheckResult::per_file(Status::Note, self.name(), entries).into())
    }
}
