//! Geometry HDF checks.

use crate::checker::{CheckError, Checker, Evaluation};
use crate::model::{groups, RasModel};
use crate::result::{CheckResult, Feature, Geometry, SpatialFlags};
use serde_json::{json, Map, Value as Json};

/// Faces shorter than this are flagged, in model units (feet).
pub const MIN_FACE_LENGTH_FT: f64 = 10.0;

/// HEC-RAS version each geometry was last saved with.
pub struct RasVersion;

impl Checker for RasVersion {
    fn id(&self) -> &'static str {
        "RasVersion"
    }
    fn name(&self) -> &'static str {
        "HEC-RAS Version"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let results = model
            .geometries
            .iter()
            .map(|g| {
                let file = g.hdf_filename();
                let message = match g.hdf.as_ref() {
                    None => "Geometry HDF file not found.".to_string(),
                    Some(hdf) => match hdf.attr(groups::ROOT, "File Version") {
                        Some(Json::String(v)) => v.clone(),
                        Some(other) => other.to_string(),
                        None => "File version is not recorded.".to_string(),
                    },
                };
                CheckResult::note(self.name(), file, message)
            })
            .collect::<Vec<_>>();
        Ok(results.into())
    }
}

/// Short 2D mesh cell faces in the current geometry, returned as spatial
/// flags.
pub struct ShortCellFaces {
    pub min_length: f64,
}

impl Default for ShortCellFaces {
    fn default() -> Self {
        ShortCellFaces {
            min_length: MIN_FACE_LENGTH_FT,
        }
    }
}

impl Checker for ShortCellFaces {
    fn id(&self) -> &'static str {
        "ShortCellFaces"
    }
    fn name(&self) -> &'static str {
        "Short Cell Faces"
    }
    fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
        let Some(geom) = model.current_geometry() else {
            return Ok(CheckResult::warning(
                self.name(),
                model.project.filename(),
                "No current geometry is set.",
            )
            .into());
        };
        let file = geom.hdf_filename();
        let Some(hdf) = geom.hdf.as_ref() else {
            return Ok(CheckResult::warning(self.name(), file, "Geometry HDF file not found.").into());
        };
        let Some(faces) = hdf.mesh_faces.as_ref() else {
            return Ok(CheckResult::warning(
                self.name(),
                file,
                "Mesh face data is not available in the geometry HDF.",
            )
            .into());
        };
        let features: Vec<Feature> = faces
            .iter()
            .filter_map(|face| {
                let length = face.length();
                (length < self.min_length).then(|| {
                    let mut properties = Map::new();
                    properties.insert("mesh_name".into(), json!(face.mesh));
                    properties.insert("face_id".into(), json!(face.face_id));
                    properties.insert("length".into(), json!(length));
                    Feature {
                        geometry: Geometry::LineString(face.coords.clone()),
                        properties,
                    }
                })
            })
            .collect();
        if features.is_empty() {
            return Ok(CheckResult::ok(self.name(), file)
                .with_message("no short cell faces found")
                .into());
        }
        Ok(CheckResult::error(
            self.name(),
            file,
            format!("{} short cell faces found", features.len()),
        )
        .with_spatial_flags(SpatialFlags::new(features))
        .into())
    }
}
