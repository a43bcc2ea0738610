//! Built-in checkers and the static table that registers them.
//!
//! Table order is the execution order inside each suite, so every
//! dependency appears before its dependents.

mod files;
mod geometry;
mod naming;
mod plan_settings;
mod volume;

pub use files::{CurrentPlan, FileStructure, GeomHdfExists, ModelFilesExist, PlanHdfExists};
pub use geometry::{RasVersion, ShortCellFaces, MIN_FACE_LENGTH_FT};
pub use naming::{
    BoundaryLocationPattern, D2FlowAreaPattern, GeometryTitlePattern, PlanShortIdPattern,
    PlanTitlePattern, PrjFilenamePattern, UnsteadyFlowTitlePattern,
};
pub use plan_settings::{ComputationSettings, EquationSet2D};
pub use volume::{VolumeAccounting, VOLUME_ERROR_TOLERANCE};

use crate::checker::CheckError;
use crate::registry::Registration;
use serde_json::Value as Json;
use std::sync::Arc;

pub fn registrations() -> Vec<Registration> {
    vec![
        Registration {
            factory: |_| Arc::new(ModelFilesExist),
            suites: &["ffrd", "ble"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(PrjFilenamePattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(GeometryTitlePattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(PlanTitlePattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(PlanShortIdPattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(UnsteadyFlowTitlePattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(PlanHdfExists),
            suites: &["ffrd", "ble"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(GeomHdfExists),
            suites: &["ffrd", "ble"],
            dependencies: &[],
        },
        Registration {
            factory: |s| Arc::new(D2FlowAreaPattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &["GeomHdfExists"],
        },
        Registration {
            factory: |s| Arc::new(BoundaryLocationPattern::new(Arc::clone(s))),
            suites: &["ffrd"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(FileStructure),
            suites: &["ble"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(CurrentPlan),
            suites: &["ble"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(EquationSet2D),
            suites: &["ffrd"],
            dependencies: &["PlanHdfExists"],
        },
        Registration {
            factory: |_| Arc::new(ComputationSettings),
            suites: &["ble"],
            dependencies: &[],
        },
        Registration {
            factory: |_| Arc::new(VolumeAccounting::default()),
            suites: &["ble"],
            dependencies: &["PlanHdfExists"],
        },
        Registration {
            factory: |_| Arc::new(RasVersion),
            suites: &["ble"],
            dependencies: &["GeomHdfExists"],
        },
        Registration {
            factory: |_| Arc::new(ShortCellFaces::default()),
            suites: &["ble"],
            dependencies: &["GeomHdfExists"],
        },
    ]
}

/// Accept a scalar attribute or an array of them.
fn as_list(value: &Json, file: &str, key: &str) -> Result<Vec<Json>, CheckError> {
    match value {
        Json::Array(items) => Ok(items.clone()),
        Json::String(_) | Json::Object(_) => Ok(vec![value.clone()]),
        other => Err(CheckError::UnexpectedValue {
            file: file.to_string(),
            key: key.to_string(),
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::schema::ConventionSchema;
    use serde_json::json;

    #[test]
    fn test_table_dependencies_point_backwards() {
        let table = registrations();
        let schema = Arc::new(ConventionSchema::bundled().unwrap());
        let ids: Vec<&str> = table.iter().map(|r| (r.factory)(&schema).id()).collect();
        for (i, reg) in table.iter().enumerate() {
            for dep in reg.dependencies {
                let at = ids.iter().position(|id| id == dep).unwrap();
                assert!(at < i, "{} registered after {}", dep, ids[i]);
            }
        }
        assert!(Registry::with_builtins(schema).is_ok());
    }

    #[test]
    fn test_as_list_shapes() {
        assert_eq!(as_list(&json!("a"), "f", "k").unwrap().len(), 1);
        assert_eq!(as_list(&json!(["a", "b"]), "f", "k").unwrap().len(), 2);
        assert!(matches!(
            as_list(&json!(3), "f", "k"),
            Err(CheckError::UnexpectedValue { .. })
        ));
    }
}
