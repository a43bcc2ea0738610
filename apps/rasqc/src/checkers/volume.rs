//! Volume accounting error read from plan HDF results.

use crate::checker::{CheckError, Checker, Evaluation};
use crate::model::{groups, PlanFile, RasModel};
use crate::result::CheckResult;

/// Largest acceptable volume accounting error, in percent.
pub const VOLUME_ERROR_TOLERANCE: f64 = 2.0;

/// Unsteady volume accounting error of every plan against a tolerance.
pub struct VolumeAccounting {
    pub tolerance: f64,
}

impl Default for VolumeAccounting {
    fn default() -> Self {
        VolumeAccounting {
            tolerance: VOLUME_ERROR_TOLERANCE,
        }
    }
}

impl VolumeAccounting {
    fn check(&self, plan: &PlanFile) -> Result<CheckResult, CheckError> {
        let file = plan.file.hdf_filename();
        let Some(hdf) = plan.file.hdf.as_ref() else {
            return Ok(CheckResult::warning(self.name(), file, "Plan HDF file not found."));
        };
        let Some(raw) = hdf.attr(groups::VOLUME_ACCOUNTING, "Error Percent") else {
            return Ok(CheckResult::warning(
                self.name(),
                file,
                "Volume accounting results not found in plan HDF.",
            ));
        };
        let percent = raw.as_f64().ok_or_else(|| CheckError::UnexpectedValue {
            file: file.clone(),
            key: "Error Percent".into(),
            found: raw.to_string(),
        })?;
        if percent > self.tolerance {
            return Ok(CheckResult::error(
                self.name(),
                file,
                format!(
                    "Volume accounting error percent of '{}' is greater than the acceptable tolerance of {:.1}.",
                    percent, self.tolerance
                ),
            ));
        }
        Ok(CheckResult::ok(self.name(), file))
    }
}

impl Checker for VolumeAccounting {
    fn id(&self) -> &'static str {
        "VolumeAccounting"
    }
    fn name(&self) -> &'static str {
        "Volume Accounting Error"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let results = model
            .plans
            .iter()
            .map(|p| self.check(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results.into())
    }
}
