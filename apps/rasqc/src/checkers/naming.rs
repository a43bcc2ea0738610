//! Naming-convention checkers backed by the convention schema.

use super::as_list;
use crate::checker::{CheckError, Checker, Evaluation};
use crate::model::{groups, ModelFile, RasModel};
use crate::result::CheckResult;
use crate::schema::ConventionSchema;
use serde_json::Value as Json;
use std::sync::Arc;

/// Project filename against `prj_filename`.
pub struct PrjFilenamePattern {
    schema: Arc<ConventionSchema>,
}

impl PrjFilenamePattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        PrjFilenamePattern { schema }
    }
}

impl Checker for PrjFilenamePattern {
    fn id(&self) -> &'static str {
        "PrjFilenamePattern"
    }
    fn name(&self) -> &'static str {
        "Project filename pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["prj_filename"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let filename = model.project.filename();
        let value = Json::String(filename.clone());
        Ok(self
            .schema
            .validate("prj_filename", &value, self.name(), filename)?
            .into())
    }
}

/// Every geometry title against `geometry_title`.
pub struct GeometryTitlePattern {
    schema: Arc<ConventionSchema>,
}

impl GeometryTitlePattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        GeometryTitlePattern { schema }
    }
}

impl Checker for GeometryTitlePattern {
    fn id(&self) -> &'static str {
        "GeometryTitlePattern"
    }
    fn name(&self) -> &'static str {
        "Geometry title pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["geometry_title"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::with_capacity(model.geometries.len());
        for geom in &model.geometries {
            if let Some(r) = unread(self.name(), geom) {
                out.push(r);
                continue;
            }
            let value = Json::String(geom.title.clone());
            out.push(
                self.schema
                    .validate("geometry_title", &value, self.name(), geom.filename())?,
            );
        }
        Ok(out.into())
    }
}

/// Plan titles accept either the current or the legacy convention.
pub struct PlanTitlePattern {
    schema: Arc<ConventionSchema>,
}

impl PlanTitlePattern {
    const CANDIDATES: [&'static str; 2] = ["plan_title", "plan_title_legacy"];

    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        PlanTitlePattern { schema }
    }
}

impl Checker for PlanTitlePattern {
    fn id(&self) -> &'static str {
        "PlanTitlePattern"
    }
    fn name(&self) -> &'static str {
        "Plan title pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        Self::CANDIDATES.to_vec()
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::with_capacity(model.plans.len());
        for plan in &model.plans {
            if let Some(r) = unread(self.name(), &plan.file) {
                out.push(r);
                continue;
            }
            let value = Json::String(plan.file.title.clone());
            out.push(self.schema.validate_any(
                &Self::CANDIDATES,
                &value,
                self.name(),
                plan.file.filename(),
            )?);
        }
        Ok(out.into())
    }
}

pub struct UnsteadyFlowTitlePattern {
    schema: Arc<ConventionSchema>,
}

impl UnsteadyFlowTitlePattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        UnsteadyFlowTitlePattern { schema }
    }
}

impl Checker for UnsteadyFlowTitlePattern {
    fn id(&self) -> &'static str {
        "UnsteadyFlowTitlePattern"
    }
    fn name(&self) -> &'static str {
        "Unsteady Flow title pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["unsteady_flow_title"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::with_capacity(model.unsteady_flows.len());
        for flow in &model.unsteady_flows {
            if let Some(r) = unread(self.name(), flow) {
                out.push(r);
                continue;
            }
            let value = Json::String(flow.title.clone());
            out.push(self.schema.validate(
                "unsteady_flow_title",
                &value,
                self.name(),
                flow.filename(),
            )?);
        }
        Ok(out.into())
    }
}

/// Plan short identifiers against `plan_short_id`.
pub struct PlanShortIdPattern {
    schema: Arc<ConventionSchema>,
}

impl PlanShortIdPattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        PlanShortIdPattern { schema }
    }
}

impl Checker for PlanShortIdPattern {
    fn id(&self) -> &'static str {
        "PlanShortIdPattern"
    }
    fn name(&self) -> &'static str {
        "Plan short ID pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["plan_short_id"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::with_capacity(model.plans.len());
        for plan in &model.plans {
            if let Some(r) = unread(self.name(), &plan.file) {
                out.push(r);
                continue;
            }
            let file = plan.file.filename();
            match plan.file.short_id.as_deref() {
                Some(id) => out.push(self.schema.validate(
                    "plan_short_id",
                    &Json::String(id.to_string()),
                    self.name(),
                    file,
                )?),
                None => out.push(CheckResult::note(
                    self.name(),
                    file,
                    "No short identifier is recorded in the plan file.",
                )),
            }
        }
        Ok(out.into())
    }
}

// Titles of files missing from disk cannot be checked.
fn unread(rule: &str, file: &ModelFile) -> Option<CheckResult> {
    (!file.exists).then(|| CheckResult::note(rule, file.filename(), "File not found; title not checked."))
}

/// 2D flow area names recorded in each geometry HDF.
pub struct D2FlowAreaPattern {
    schema: Arc<ConventionSchema>,
}

impl D2FlowAreaPattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        D2FlowAreaPattern { schema }
    }
}

impl Checker for D2FlowAreaPattern {
    fn id(&self) -> &'static str {
        "D2FlowAreaPattern"
    }
    fn name(&self) -> &'static str {
        "2D Flow Area pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["2d_flow_element"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::new();
        for geom in &model.geometries {
            let file = geom.hdf_filename();
            let names = match geom.hdf.as_ref() {
                None => {
                    out.push(CheckResult::note(self.name(), file, "Geometry HDF file not found."));
                    continue;
                }
                Some(hdf) => hdf.attr(groups::FLOW_AREAS_2D, "Names"),
            };
            let Some(names) = names else {
                out.push(CheckResult::note(
                    self.name(),
                    file,
                    "No 2D Flow Area names are recorded in the geometry HDF.",
                ));
                continue;
            };
            for name in as_list(names, &file, "Names")? {
                out.push(
                    self.schema
                        .validate("2d_flow_element", &name, self.name(), file.as_str())?,
                );
            }
        }
        Ok(out.into())
    }
}

/// Boundary condition line names from each plan HDF. Entries are stored as
/// single-entry mappings such as `{"Name": "us-bald-eagle"}`.
pub struct BoundaryLocationPattern {
    schema: Arc<ConventionSchema>,
}

impl BoundaryLocationPattern {
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        BoundaryLocationPattern { schema }
    }
}

impl Checker for BoundaryLocationPattern {
    fn id(&self) -> &'static str {
        "BoundaryLocationPattern"
    }
    fn name(&self) -> &'static str {
        "Boundary Condition location pattern"
    }
    fn required_properties(&self) -> Vec<&'static str> {
        vec!["bc_location"]
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let mut out = Vec::new();
        for plan in &model.plans {
            let file = plan.file.hdf_filename();
            let names = match plan.file.hdf.as_ref() {
                None => {
                    out.push(CheckResult::note(self.name(), file, "Plan HDF file not found."));
                    continue;
                }
                Some(hdf) => hdf.attr(groups::BOUNDARY_LOCATIONS, "Names"),
            };
            let Some(names) = names else {
                out.push(CheckResult::note(
                    self.name(),
                    file,
                    "No boundary condition locations are recorded in the plan HDF.",
                ));
                continue;
            };
            for entry in as_list(names, &file, "Names")? {
                out.push(
                    self.schema
                        .validate("bc_location", &entry, self.name(), file.as_str())?,
                );
            }
        }
        Ok(out.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrStore;
    use crate::result::{Examples, Status};
    use serde_json::{json, Map};

    fn schema() -> Arc<ConventionSchema> {
        Arc::new(ConventionSchema::bundled().unwrap())
    }

    fn group(v: Json) -> Map<String, Json> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_prj_filename_error_names_file_and_rule() {
        let m = RasModel::builder("/m/BaldEagleDamBrk.prj", "Dam").build();
        let rs = PrjFilenamePattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results();
        assert_eq!(rs.len(), 1);
        let r = &rs[0];
        assert_eq!(r.status, Status::Error);
        let msg = r.message.as_ref().unwrap().render();
        assert!(msg.contains("BaldEagleDamBrk.prj"));
        assert!(msg.contains("lowercase letters"));
        assert_eq!(r.pattern.as_deref(), Some(r"^[a-z0-9-]+\.prj$"));
    }

    #[test]
    fn test_prj_filename_ok() {
        let m = RasModel::builder("/m/bald-eagle-creek.prj", "Dam").build();
        let r = PrjFilenamePattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results()
            .remove(0);
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.matched_element.as_deref(), Some("bald-eagle-creek.prj"));
    }

    #[test]
    fn test_titles_one_result_per_file() {
        let m = RasModel::builder("/m/model.prj", "Model")
            .geometry("g01", "bald-eagle", None)
            .geometry("g02", "Bald Eagle FFRD", None)
            .unsteady_flow("u01", "2024-01-15", None)
            .plan("p01", "synthetic-storm:2024-01-15", "g01", "u01", None)
            .plan("p02", "Jan2023 100yr", "g01", "u01", None)
            .plan("p03", "whatever", "g02", "u01", None)
            .build();
        let geoms = GeometryTitlePattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results();
        assert_eq!(
            geoms.iter().map(|r| r.status).collect::<Vec<_>>(),
            vec![Status::Ok, Status::Error]
        );
        assert_eq!(geoms[1].target.files(), vec!["model.g02"]);

        let plans = PlanTitlePattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results();
        assert_eq!(
            plans.iter().map(|r| r.status).collect::<Vec<_>>(),
            vec![Status::Ok, Status::Ok, Status::Error]
        );
        assert!(matches!(plans[2].examples, Some(Examples::PerCandidate(ref e)) if e.len() == 2));

        let flows = UnsteadyFlowTitlePattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results();
        assert_eq!(flows[0].status, Status::Ok);
    }

    #[test]
    fn test_boundary_locations_unwrap_nested_entries() {
        let hdf = AttrStore::new().with_group(
            groups::BOUNDARY_LOCATIONS,
            group(json!({"Names": [{"Name": "us-bald-eagle"}, {"Name": " Lock Haven "}]})),
        );
        let m = RasModel::builder("/m/model.prj", "Model")
            .plan("p01", "p", "g01", "u01", Some(hdf))
            .plan("p02", "p", "g01", "u01", None)
            .build();
        let rs = BoundaryLocationPattern::new(schema())
            .evaluate(&m)
            .unwrap()
            .into_results();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs[0].status, Status::Ok);
        assert_eq!(rs[1].status, Status::Error);
        assert_eq!(rs[1].matched_element.as_deref(), Some("Lock Haven"));
        assert_eq!(rs[1].target.files(), vec!["model.p01.hdf"]);
        assert_eq!(rs[2].status, Status::Note);
        assert_eq!(rs[2].target.files(), vec!["model.p02.hdf"]);
    }

    #[test]
    fn test_missing_names_are_noted_per_file() {
        let m = RasModel::builder("/m/model.prj", "Model")
            .geometry("g01", "g", Some(AttrStore::new()))
            .geometry("g02", "g", None)
            .plan("p01", "p", "g01", "u01", Some(AttrStore::new()))
            .build();
        let areas = D2FlowAreaPattern::new(schema()).evaluate(&m).unwrap().into_results();
        assert_eq!(areas.len(), 2);
        assert!(areas.iter().all(|r| r.status == Status::Note));
        assert!(areas[0].message.as_ref().unwrap().render().contains("No 2D Flow Area names"));
        assert_eq!(areas[1].target.files(), vec!["model.g02.hdf"]);

        let bcs = BoundaryLocationPattern::new(schema()).evaluate(&m).unwrap().into_results();
        assert_eq!(bcs.len(), 1);
        assert_eq!(bcs[0].status, Status::Note);
    }

    #[test]
    fn test_short_ids_and_missing_files() {
        let m = RasModel::builder("/m/model.prj", "Model")
            .plan("p01", "synthetic-storm:2024-01-15", "g01", "u01", None)
            .plan("p02", "Short Id With Spaces", "g01", "u01", None)
            .plan("p03", "synthetic-storm:2024-01-15", "g01", "u01", None)
            .missing("p03")
            .build();
        let rs = PlanShortIdPattern::new(schema()).evaluate(&m).unwrap().into_results();
        assert_eq!(
            rs.iter().map(|r| r.status).collect::<Vec<_>>(),
            vec![Status::Ok, Status::Error, Status::Note]
        );
        assert_eq!(rs[2].target.files(), vec!["model.p03"]);

        let titles = PlanTitlePattern::new(schema()).evaluate(&m).unwrap().into_results();
        assert_eq!(titles[2].status, Status::Note);
    }

    #[test]
    fn test_flow_area_names_bad_shape_is_fault() {
        let hdf = AttrStore::new().with_group(groups::FLOW_AREAS_2D, group(json!({"Names": 7})));
        let m = RasModel::builder("/m/model.prj", "Model")
            .geometry("g01", "g", Some(hdf))
            .build();
        assert!(D2FlowAreaPattern::new(schema()).evaluate(&m).is_err());
    }
}
