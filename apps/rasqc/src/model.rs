//! Read-only model handle consumed by checkers.
//!
//! The reader here only understands the `Key=Value` text files of a HEC-RAS
//! project (project, plan, geometry and unsteady-flow files). Binary result
//! stores are reached through the `HdfLoader` seam and surface as an opaque
//! `AttrStore`. Absence of any optional piece is an `Option`, never an error;
//! only an unreadable project file stops `RasModel::open`.

use crate::error::ModelError;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
/// A 2D mesh cell face polyline.
pub struct MeshFace {
    pub mesh: String,
    pub face_id: usize,
    pub coords: Vec<[f64; 2]>,
}

impl MeshFace {
    pub fn length(&self) -> f64 {
        self.coords
            .windows(2)
            .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Attribute groups and mesh collections of an HDF-like store.
pub struct AttrStore {
    groups: BTreeMap<String, Map<String, Json>>,
    /// `None` when the loader did not read mesh geometry at all.
    pub mesh_faces: Option<Vec<MeshFace>>,
}

impl AttrStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, attrs: Map<String, Json>) -> Self {
        self.groups.insert(name.to_string(), attrs);
        self
    }

    pub fn with_mesh_faces(mut self, faces: Vec<MeshFace>) -> Self {
        self.mesh_faces = Some(faces);
        self
    }

    pub fn group(&self, name: &str) -> Option<&Map<String, Json>> {
        self.groups.get(name)
    }

    pub fn attr(&self, group: &str, key: &str) -> Option<&Json> {
        self.groups.get(group).and_then(|g| g.get(key))
    }
}

/// Attribute group names used by built-in checkers.
pub mod groups {
    pub const ROOT: &str = "Root";
    pub const PLAN_PARAMETERS: &str = "Plan Data/Plan Parameters";
    pub const PLAN_INFORMATION: &str = "Plan Data/Plan Information";
    pub const VOLUME_ACCOUNTING: &str = "Results/Unsteady/Summary/Volume Accounting";
    pub const BOUNDARY_LOCATIONS: &str = "Event Conditions/Boundary Locations";
    pub const FLOW_AREAS_2D: &str = "Geometry/2D Flow Areas";
}

/// Loads the attribute store that sits next to a model file.
pub trait HdfLoader: Send + Sync {
    fn load(&self, hdf_path: &Path) -> Option<AttrStore>;
}

/// Records only whether the HDF file exists.
pub struct PresenceOnly;

impl HdfLoader for PresenceOnly {
    fn load(&self, hdf_path: &Path) -> Option<AttrStore> {
        hdf_path.is_file().then(AttrStore::new)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One file of the model.
pub struct ModelFile {
    pub path: PathBuf,
    /// False when the project references the file but it is not on disk.
    pub exists: bool,
    pub title: String,
    pub description: Option<String>,
    pub short_id: Option<String>,
    pub hdf_path: Option<PathBuf>,
    pub hdf: Option<AttrStore>,
}

impl ModelFile {
    fn new(path: PathBuf, title: &str) -> Self {
        ModelFile {
            path,
            exists: true,
            title: title.to_string(),
            description: None,
            short_id: None,
            hdf_path: None,
            hdf: None,
        }
    }

    pub fn filename(&self) -> String {
        file_name(&self.path)
    }

    /// Extension token such as `p13` or `g06`.
    pub fn ext(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn hdf_filename(&self) -> String {
        self.hdf_path
            .as_deref()
            .map(file_name)
            .unwrap_or_else(|| format!("{}.hdf", self.filename()))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Plan file plus the geometry and flow files it references.
pub struct PlanFile {
    pub file: ModelFile,
    pub geom_ext: Option<String>,
    pub flow_ext: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Parsed HEC-RAS project.
pub struct RasModel {
    pub project: ModelFile,
    pub plans: Vec<PlanFile>,
    pub geometries: Vec<ModelFile>,
    pub unsteady_flows: Vec<ModelFile>,
    pub current_plan_ext: Option<String>,
}

impl RasModel {
    /// Open a project, recording sibling HDF presence only.
    pub fn open(prj: &Path) -> Result<Self, ModelError> {
        Self::open_with(prj, &PresenceOnly)
    }

    pub fn open_with(prj: &Path, loader: &dyn HdfLoader) -> Result<Self, ModelError> {
        let content = read_text(prj)?;
        let entries = parse_entries(&content);
        let title = first_value(&entries, "Proj Title").unwrap_or_else(|| {
            log::warn!("{} has no 'Proj Title' entry", prj.display());
            String::new()
        });
        let mut project = ModelFile::new(prj.to_path_buf(), &title);
        project.description = parse_description(&content);

        let geometries = all_values(&entries, "Geom File")
            .iter()
            .map(|ext| read_model_file(prj, ext, "Geom Title", loader).0)
            .collect::<Vec<_>>();
        let unsteady_flows = all_values(&entries, "Unsteady File")
            .iter()
            .map(|ext| read_model_file(prj, ext, "Flow Title", loader).0)
            .collect::<Vec<_>>();
        let mut plans = Vec::new();
        for ext in all_values(&entries, "Plan File") {
            let (mut file, plan_entries) = read_model_file(prj, &ext, "Plan Title", loader);
            file.short_id = first_value(&plan_entries, "Short Identifier");
            let geom_ext = first_value(&plan_entries, "Geom File");
            let flow_ext = first_value(&plan_entries, "Flow File");
            if file.exists && (geom_ext.is_none() || flow_ext.is_none()) {
                log::warn!("{} does not reference both a geometry and a flow file", file.path.display());
            }
            plans.push(PlanFile {
                file,
                geom_ext,
                flow_ext,
            });
        }
        log::debug!(
            "opened model {} ({} plans, {} geometries, {} flows)",
            prj.display(),
            plans.len(),
            geometries.len(),
            unsteady_flows.len()
        );
        Ok(RasModel {
            project,
            plans,
            geometries,
            unsteady_flows,
            current_plan_ext: first_value(&entries, "Current Plan"),
        })
    }

    pub fn builder(prj: impl Into<PathBuf>, title: &str) -> ModelBuilder {
        ModelBuilder {
            model: RasModel {
                project: ModelFile::new(prj.into(), title),
                plans: Vec::new(),
                geometries: Vec::new(),
                unsteady_flows: Vec::new(),
                current_plan_ext: None,
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.project.title
    }

    pub fn geometry(&self, ext: &str) -> Option<&ModelFile> {
        self.geometries.iter().find(|g| g.ext() == ext)
    }

    pub fn unsteady_flow(&self, ext: &str) -> Option<&ModelFile> {
        self.unsteady_flows.iter().find(|f| f.ext() == ext)
    }

    pub fn current_plan(&self) -> Option<&PlanFile> {
        let ext = self.current_plan_ext.as_deref()?;
        self.plans.iter().find(|p| p.file.ext() == ext)
    }

    pub fn current_geometry(&self) -> Option<&ModelFile> {
        self.current_plan()
            .and_then(|p| p.geom_ext.as_deref())
            .and_then(|ext| self.geometry(ext))
    }

    /// Every text file the project references, in project order: plans,
    /// then geometries, then unsteady flows.
    pub fn referenced_files(&self) -> impl Iterator<Item = &ModelFile> {
        self.plans
            .iter()
            .map(|p| &p.file)
            .chain(self.geometries.iter())
            .chain(self.unsteady_flows.iter())
    }
}

/// In-memory construction of a model, used by embedders and tests.
pub struct ModelBuilder {
    model: RasModel,
}

impl ModelBuilder {
    pub fn description(mut self, text: &str) -> Self {
        self.model.project.description = Some(text.to_string());
        self
    }

    pub fn geometry(mut self, ext: &str, title: &str, hdf: Option<AttrStore>) -> Self {
        let file = self.sibling(ext, title, hdf);
        self.model.geometries.push(file);
        self
    }

    pub fn unsteady_flow(mut self, ext: &str, title: &str, hdf: Option<AttrStore>) -> Self {
        let file = self.sibling(ext, title, hdf);
        self.model.unsteady_flows.push(file);
        self
    }

    pub fn plan(
        mut self,
        ext: &str,
        title: &str,
        geom_ext: &str,
        flow_ext: &str,
        hdf: Option<AttrStore>,
    ) -> Self {
        let mut file = self.sibling(ext, title, hdf);
        file.short_id = Some(title.to_string());
        self.model.plans.push(PlanFile {
            file,
            geom_ext: Some(geom_ext.to_string()),
            flow_ext: Some(flow_ext.to_string()),
        });
        self
    }

    pub fn current_plan(mut self, ext: &str) -> Self {
        self.model.current_plan_ext = Some(ext.to_string());
        self
    }

    /// Mark a referenced file (by extension) as absent from disk.
    pub fn missing(mut self, ext: &str) -> Self {
        let m = &mut self.model;
        let files = m
            .plans
            .iter_mut()
            .map(|p| &mut p.file)
            .chain(m.geometries.iter_mut())
            .chain(m.unsteady_flows.iter_mut());
        for f in files.filter(|f| f.ext() == ext) {
            f.exists = false;
        }
        self
    }

    pub fn build(self) -> RasModel {
        self.model
    }

    fn sibling(&self, ext: &str, title: &str, hdf: Option<AttrStore>) -> ModelFile {
        let path = self.model.project.path.with_extension(ext);
        let mut file = ModelFile::new(path.clone(), title);
        file.hdf_path = Some(hdf_path_for(&path));
        file.hdf = hdf;
        file
    }
}

/// Locate the project file inside a directory (first `*.prj` by name).
pub fn find_project(dir: &Path) -> Result<PathBuf, ModelError> {
    let pattern = dir.join("*.prj").to_string_lossy().to_string();
    let mut found: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|_| ModelError::NoProject(dir.to_path_buf()))?
        .flatten()
        .collect();
    found.sort();
    found
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::NoProject(dir.to_path_buf()))
}

// A referenced file that cannot be read is recorded with `exists = false`
// and an empty title; presence checkers report it.
fn read_model_file(
    prj: &Path,
    ext: &str,
    title_key: &str,
    loader: &dyn HdfLoader,
) -> (ModelFile, Vec<(String, String)>) {
    let path = prj.with_extension(ext);
    let (content, exists) = match read_text(&path) {
        Ok(c) => (c, true),
        Err(e) => {
            log::warn!("{}", e);
            (String::new(), false)
        }
    };
    let entries = parse_entries(&content);
    let title = first_value(&entries, title_key).unwrap_or_default();
    let mut file = ModelFile::new(path.clone(), &title);
    file.exists = exists;
    file.description = parse_description(&content);
    let hdf_path = hdf_path_for(&path);
    file.hdf = loader.load(&hdf_path);
    file.hdf_path = Some(hdf_path);
    (file, entries)
}

fn hdf_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".hdf");
    PathBuf::from(s)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn read_text(path: &Path) -> Result<String, ModelError> {
    if !path.is_file() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| ModelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // HEC-RAS writes Windows-1252; lossy decoding keeps keys intact.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_entries(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn first_value(entries: &[(String, String)], key: &str) -> Option<String> {
    entries
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
}

fn all_values(entries: &[(String, String)], key: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.clone())
        .collect()
}

fn parse_description(content: &str) -> Option<String> {
    let start = content.find("BEGIN DESCRIPTION:")? + "BEGIN DESCRIPTION:".len();
    let end = content[start..].find("END DESCRIPTION:")? + start;
    let text = content[start..end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_open_reads_project_structure() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "Dam.prj",
            "Proj Title=Bald Eagle Creek Example Dam Break Study\nCurrent Plan=p18\nGeom File=g06\nGeom File=g11\nUnsteady File=u07\nUnsteady File=u10\nPlan File=p13\nPlan File=p18\nBEGIN DESCRIPTION:\nDemo model.\nEND DESCRIPTION:\n",
        );
        write(root, "Dam.g06", "Geom Title=Bald Eagle Multi 2D Areas\n");
        write(root, "Dam.g11", "Geom Title=2D to 2D Connection\n");
        write(root, "Dam.u07", "Flow Title=PMF with Multi 2D Areas\n");
        write(root, "Dam.u10", "Flow Title=1972 Flood Event - 2D to 2D Run\n");
        write(
            root,
            "Dam.p13",
            "Plan Title=PMF with Multi 2D Areas\nShort Identifier=PMF Multi 2D\nGeom File=g06\nFlow File=u07\n",
        );
        write(
            root,
            "Dam.p18",
            "Plan Title=2D to 2D Run\nShort Identifier=2D to 2D Run\nGeom File=g11\nFlow File=u10\n",
        );
        write(root, "Dam.p18.hdf", "");

        let m = RasModel::open(&root.join("Dam.prj")).unwrap();
        assert_eq!(m.title(), "Bald Eagle Creek Example Dam Break Study");
        assert_eq!(m.project.description.as_deref(), Some("Demo model."));
        assert_eq!(m.plans.len(), 2);
        assert_eq!(m.plans[0].geom_ext.as_deref(), Some("g06"));
        assert_eq!(m.plans[1].file.short_id.as_deref(), Some("2D to 2D Run"));
        assert!(m.plans[0].file.hdf.is_none());
        assert!(m.plans[1].file.hdf.is_some());
        assert_eq!(m.plans[0].file.hdf_filename(), "Dam.p13.hdf");
        assert_eq!(m.current_geometry().unwrap().filename(), "Dam.g11");
        assert_eq!(m.unsteady_flow("u10").unwrap().title, "1972 Flood Event - 2D to 2D Run");
        assert_eq!(find_project(root).unwrap(), root.join("Dam.prj"));
    }

    #[test]
    fn test_missing_referenced_files_are_recorded_not_fatal() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "m.prj", "Proj Title=M\nGeom File=g01\nPlan File=p01\nPlan File=p02\n");
        write(root, "m.p01", "Plan Title=first\nFlow File=u01\n");
        let m = RasModel::open(&root.join("m.prj")).unwrap();
        assert_eq!(m.plans.len(), 2);
        assert!(m.plans[0].file.exists);
        assert_eq!(m.plans[0].geom_ext, None);
        assert_eq!(m.plans[0].flow_ext.as_deref(), Some("u01"));
        assert!(!m.plans[1].file.exists);
        assert_eq!(m.plans[1].file.title, "");
        assert!(!m.geometries[0].exists);
        let names: Vec<String> = m.referenced_files().map(|f| f.filename()).collect();
        assert_eq!(names, vec!["m.p01", "m.p02", "m.g01"]);
    }

    #[test]
    fn test_missing_project_is_not_found() {
        let dir = tempdir().unwrap();
        let err = RasModel::open(&dir.path().join("none.prj")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_mesh_face_length() {
        let face = MeshFace {
            mesh: "A".into(),
            face_id: 0,
            coords: vec![[0.0, 0.0], [3.0, 4.0], [3.0, 10.0]],
        };
        assert!((face.length() - 11.0).abs() < 1e-9);
    }
}
