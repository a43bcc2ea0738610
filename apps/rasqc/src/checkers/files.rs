//! Model file presence and structure reports.

use crate::checker::{CheckError, Checker, Evaluation};
use crate::model::{ModelFile, RasModel};
use crate::result::CheckResult;
use serde_json::{json, Map, Value as Json};

/// ERROR for every referenced plan, geometry or unsteady-flow file missing
/// from disk; WARNING for a plan that does not name its geometry or flow.
pub struct ModelFilesExist;

impl Checker for ModelFilesExist {
    fn id(&self) -> &'static str {
        "ModelFilesExist"
    }
    fn name(&self) -> &'static str {
        "Model Files Exist"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out: Vec<CheckResult> = model
            .referenced_files()
            .map(|f| {
                if f.exists {
                    CheckResult::ok(self.name(), f.filename())
                } else {
                    CheckResult::error(
                        self.name(),
                        f.filename(),
                        format!("'{}' is listed in the project but not found.", f.filename()),
                    )
                }
            })
            .collect();
        for plan in model.plans.iter().filter(|p| p.file.exists) {
            let unnamed: Vec<&str> = [("geometry", &plan.geom_ext), ("unsteady flow", &plan.flow_ext)]
                .into_iter()
                .filter(|(_, ext)| ext.is_none())
                .map(|(kind, _)| kind)
                .collect();
            if !unnamed.is_empty() {
                out.push(CheckResult::warning(
                    self.name(),
                    plan.file.filename(),
                    format!("Plan does not reference a {} file.", unnamed.join(" or ")),
                ));
            }
        }
        Ok(out.into())
    }
}

/// ERROR for every plan whose HDF results file is absent.
pub struct PlanHdfExists;

impl Checker for PlanHdfExists {
    fn id(&self) -> &'static str {
        "PlanHdfExists"
    }
    fn name(&self) -> &'static str {
        "Plan HDF Exists"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        Ok(model
            .plans
            .iter()
            .map(|p| presence(self.name(), &p.file, "Plan HDF file not found."))
            .collect::<Vec<_>>()
            .into())
    }
}

/// ERROR for every geometry whose HDF file is absent.
pub struct GeomHdfExists;

impl Checker for GeomHdfExists {
    fn id(&self) -> &'static str {
        "GeomHdfExists"
    }
    fn name(&self) -> &'static str {
        "Geometry HDF Exists"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        Ok(model
            .geometries
            .iter()
            .map(|g| presence(self.name(), g, "Geometry HDF file not found."))
            .collect::<Vec<_>>()
            .into())
    }
}

fn presence(rule: &str, file: &ModelFile, missing: &str) -> CheckResult {
    let target = file.hdf_filename();
    if file.hdf.is_some() {
        CheckResult::ok(rule, target)
    } else {
        CheckResult::error(rule, target, missing)
    }
}

/// Project layout for review: plans in project order with the geometry and
/// unsteady flow each one references.
pub struct FileStructure;

impl Checker for FileStructure {
    fn id(&self) -> &'static str {
        "FileStructure"
    }
    fn name(&self) -> &'static str {
        "File Structure"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut plans = Map::new();
        for plan in &model.plans {
            let mut entry = Map::new();
            entry.insert("filename".into(), json!(plan.file.filename()));
            entry.insert("title".into(), json!(plan.file.title));
            entry.insert("short id".into(), json!(plan.file.short_id));
            entry.insert("description".into(), json!(plan.file.description));
            entry.insert(
                "geometry".into(),
                describe(plan.geom_ext.as_deref().and_then(|e| model.geometry(e))),
            );
            entry.insert(
                "unsteady".into(),
                describe(plan.flow_ext.as_deref().and_then(|e| model.unsteady_flow(e))),
            );
            plans.insert(plan.file.ext(), Json::Object(entry));
        }
        let mut message = Map::new();
        message.insert("filename".into(), json!(model.project.filename()));
        message.insert("title".into(), json!(model.project.title));
        message.insert("description".into(), json!(model.project.description));
        message.insert("plans".into(), Json::Object(plans));
        Ok(CheckResult::note(self.name(), model.project.filename(), message).into())
    }
}

fn describe(file: Option<&ModelFile>) -> Json {
    match file {
        Some(f) => json!({
            "filename": f.filename(),
            "title": f.title,
            "description": f.description,
        }),
        None => Json::Null,
    }
}

/// The plan saved as current in the project file.
pub struct CurrentPlan;

impl Checker for CurrentPlan {
    fn id(&self) -> &'static str {
        "CurrentPlan"
    }
    fn name(&self) -> &'static str {
        "Current Saved Plan"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let target = model.project.filename();
        let Some(plan) = model.current_plan() else {
            return Ok(CheckResult::warning(
                self.name(),
                target,
                "No current plan is saved in the project file.",
            )
            .into());
        };
        let mut message = Map::new();
        message.insert("file".into(), json!(plan.file.filename()));
        message.insert("title".into(), json!(plan.file.title));
        Ok(CheckResult::note(self.name(), target, message).into())
    }
}
