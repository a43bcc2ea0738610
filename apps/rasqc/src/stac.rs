//! Naming checks over a STAC item that catalogs a HEC-RAS model.
//!
//! Each asset of the item carries properties such as `ras:plan_title`.
//! Property keys lose their `prefix:` before lookup, and every asset that
//! carries a checked property yields one result targeted at the asset name.
//! The checks form the `stac_ffrd` suite; none of them has dependencies.

use crate::checker::CheckError;
use crate::error::{ConfigError, ModelError};
use crate::orchestrator::{Narrator, RunReport, StatusCounts};
use crate::result::CheckResult;
use crate::schema::ConventionSchema;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::fs;
use std::path::Path;

pub const STAC_SUITE: &str = "stac_ffrd";

#[derive(Debug, Clone, Default, Deserialize)]
/// The parts of a STAC item the checks read.
pub struct StacItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub assets: Map<String, Json>,
}

impl StacItem {
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::InvalidStac {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, ModelError> {
        if !path.is_file() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }

    /// Label used as the target of item-wide results.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("STAC item")
    }

    /// Assets in document order with prefix-free property keys. Assets that
    /// are not JSON objects carry no properties and are left out.
    pub fn normalized_assets(&self) -> Vec<(&str, Map<String, Json>)> {
        self.assets
            .iter()
            .filter_map(|(name, props)| match props {
                Json::Object(map) => Some((name.as_str(), normalize_keys(map))),
                _ => {
                    log::debug!("STAC asset '{}' is not an object; ignored", name);
                    None
                }
            })
            .collect()
    }
}

/// `ras:plan_title` -> `plan_title`. Only the first `prefix:` is removed.
pub fn strip_prefix(key: &str) -> &str {
    key.split_once(':').map_or(key, |(_, rest)| rest)
}

pub fn normalize_keys(props: &Map<String, Json>) -> Map<String, Json> {
    props
        .iter()
        .map(|(k, v)| (strip_prefix(k).to_string(), v.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy)]
/// One asset-property naming rule.
pub struct StacCheck {
    pub id: &'static str,
    pub name: &'static str,
    pub property: &'static str,
}

/// The `stac_ffrd` suite, in execution order.
pub const STAC_CHECKS: [StacCheck; 6] = [
    StacCheck {
        id: "StacPlanTitlePattern",
        name: "STAC Plan title pattern",
        property: "plan_title",
    },
    StacCheck {
        id: "StacGeometryTitlePattern",
        name: "Geometry title pattern",
        property: "geometry_title",
    },
    StacCheck {
        id: "StacUnsteadyFlowTitlePattern",
        name: "Unsteady Flow title pattern",
        property: "unsteady_flow_title",
    },
    StacCheck {
        id: "StacPlanShortIdPattern",
        name: "Plan short ID pattern",
        property: "plan_short_id",
    },
    StacCheck {
        id: "StacD2FlowAreaPattern",
        name: "2D Flow Area pattern",
        property: "2d_flow_element",
    },
    StacCheck {
        id: "StacPrecipBoundaryConditionPattern",
        name: "Precip Boundary Condition name pattern",
        property: "precip_bc",
    },
];

impl StacCheck {
    pub fn evaluate(
        &self,
        schema: &ConventionSchema,
        item: &StacItem,
    ) -> Result<Vec<CheckResult>, CheckError> {
        let mut out = Vec::new();
        for (asset, props) in item.normalized_assets() {
            if let Some(value) = props.get(self.property) {
                out.push(schema.validate(self.property, value, self.name, asset)?);
            }
        }
        Ok(out)
    }
}

/// Every property the STAC checks look up must exist in the schema.
pub fn verify_schema(schema: &ConventionSchema) -> Result<(), ConfigError> {
    for check in &STAC_CHECKS {
        if schema.property(check.property).is_none() {
            return Err(ConfigError::MissingSchemaProperty {
                property: check.property.to_string(),
                checker: check.id.to_string(),
            });
        }
    }
    Ok(())
}

/// Run the `stac_ffrd` suite over `item`.
pub fn run_stac(
    schema: &ConventionSchema,
    item: &StacItem,
    narrator: &mut dyn Narrator,
) -> RunReport {
    log::info!(
        "running suite '{}' ({} checkers) on {}",
        STAC_SUITE,
        STAC_CHECKS.len(),
        item.label()
    );
    let mut results = Vec::new();
    for check in &STAC_CHECKS {
        let produced = match check.evaluate(schema, item) {
            Ok(rs) => rs,
            Err(e) => {
                log::warn!("checker '{}' failed: {}", check.id, e);
                vec![CheckResult::error(
                    check.name,
                    item.label(),
                    format!("Checker '{}' failed: {}", check.name, e),
                )]
            }
        };
        narrator.checker_finished(check.name, &produced);
        results.extend(produced);
    }
    let counts = StatusCounts::from_results(&results);
    RunReport { results, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Silent;
    use crate::result::Status;
    use std::path::PathBuf;

    fn item() -> StacItem {
        StacItem::from_json_str(
            r#"{
              "id": "bald-eagle-creek",
              "assets": {
                "bald-eagle.p01": {
                  "ras:plan_title": "synthetic-storm:2024-01-15",
                  "ras:short_id": "ignored",
                  "ras:plan_short_id": "Storm 1",
                  "roles": ["ras-file"]
                },
                "bald-eagle.g01": { "ras:geometry_title": " bald-eagle " },
                "bald-eagle.u01": {
                  "ras:unsteady_flow_title": "2024-01-15",
                  "ras:precip_bc": "/SHG/BALD-EAGLE/PRECIP/01JAN2024:0000/01JAN2024:0100/AORC/"
                },
                "thumbnail": "not-an-object"
              }
            }"#,
            &PathBuf::from("item.json"),
        )
        .unwrap()
    }

    fn schema() -> ConventionSchema {
        ConventionSchema::bundled().unwrap()
    }

    #[test]
    fn test_strip_prefix_removes_first_segment_only() {
        assert_eq!(strip_prefix("ras:plan_title"), "plan_title");
        assert_eq!(strip_prefix("plan_title"), "plan_title");
        assert_eq!(strip_prefix("a:b:c"), "b:c");
    }

    #[test]
    fn test_assets_without_property_produce_nothing() {
        let rs = STAC_CHECKS[0].evaluate(&schema(), &item()).unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(rs[0].status, Status::Ok);
        assert_eq!(rs[0].target.files(), vec!["bald-eagle.p01"]);
    }

    #[test]
    fn test_suite_run_in_order_with_trimmed_values() {
        let s = schema();
        verify_schema(&s).unwrap();
        let rep = run_stac(&s, &item(), &mut Silent);
        let seen: Vec<(&str, Status)> = rep
            .results
            .iter()
            .map(|r| (r.rule_name.as_str(), r.status))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("STAC Plan title pattern", Status::Ok),
                ("Geometry title pattern", Status::Ok),
                ("Unsteady Flow title pattern", Status::Ok),
                ("Plan short ID pattern", Status::Error),
                ("Precip Boundary Condition name pattern", Status::Ok),
            ]
        );
        assert_eq!(rep.results[1].matched_element.as_deref(), Some("bald-eagle"));
        assert!(rep.results[3].message.as_ref().unwrap().render().contains("'Storm 1'"));
        assert_eq!(rep.counts.exit_policy().exit_code(), 1);
    }

    #[test]
    fn test_bad_item_is_model_error() {
        let err = StacItem::from_json_str("{", &PathBuf::from("x.json")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidStac { .. }));
    }
}
