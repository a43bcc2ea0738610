//! Report documents written for a finished run: the JSON report, the
//! themed HTML log and one GeoJSON layer per rule that flagged features.

use crate::error::{ConfigError, ExportError};
use crate::model::RasModel;
use crate::registry::SuiteName;
use crate::result::{CheckResult, Status};
use crate::summary;
use quick_xml::escape::escape;
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// `{model, checksuite, timestamp, checks}`. Apart from `timestamp` the
/// document is a pure function of its inputs.
pub fn compose_report_json(
    model: &str,
    suite: &str,
    timestamp: &str,
    results: &[CheckResult],
) -> Json {
    json!({
        "model": model,
        "checksuite": suite,
        "timestamp": timestamp,
        "checks": results.iter().map(CheckResult::to_json).collect::<Vec<_>>(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorTheme {
    #[default]
    Nineties,
    Arcade,
    Adams,
    Arctic,
}

/// CSS colors of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub heading1: &'static str,
    pub heading2: &'static str,
    pub body: &'static str,
    pub shadow: &'static str,
}

impl ColorTheme {
    pub fn palette(&self) -> Palette {
        match self {
            ColorTheme::Nineties => Palette {
                background: "rgb(50, 50, 50)",
                heading1: "rgb(13, 162, 149)",
                heading2: "rgb(150, 111, 255)",
                body: "rgb(170, 170, 170)",
                shadow: "rgb(100, 100, 100)",
            },
            ColorTheme::Arcade => Palette {
                background: "rgb(50, 50, 50)",
                heading1: "rgb(20, 180, 160)",
                heading2: "rgb(140, 140, 255)",
                body: "rgb(170, 170, 170)",
                shadow: "rgb(100, 100, 100)",
            },
            ColorTheme::Adams => Palette {
                background: "rgb(82, 94, 100)",
                heading1: "rgb(100, 60, 30)",
                heading2: "rgb(60, 60, 60)",
                body: "rgb(170, 170, 170)",
                shadow: "rgb(100, 100, 100)",
            },
            ColorTheme::Arctic => Palette {
                background: "rgb(255, 255, 255)",
                heading1: "rgb(0, 220, 200)",
                heading2: "rgb(200, 200, 240)",
                body: "rgb(160, 180, 200)",
                shadow: "rgb(0, 220, 200)",
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTheme::Nineties => "nineties",
            ColorTheme::Arcade => "arcade",
            ColorTheme::Adams => "adams",
            ColorTheme::Arctic => "arctic",
        }
    }
}

impl FromStr for ColorTheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nineties" | "ninetys" => Ok(ColorTheme::Nineties),
            "arcade" => Ok(ColorTheme::Arcade),
            "adams" => Ok(ColorTheme::Adams),
            "arctic" => Ok(ColorTheme::Arctic),
            _ => Err(ConfigError::UnknownTheme(s.to_string())),
        }
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything written by a files-mode run.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFiles {
    pub html_log: PathBuf,
    pub layers: Vec<PathBuf>,
    pub summary_json: PathBuf,
    pub workbook: PathBuf,
}

/// Write the HTML log, GeoJSON layers and summary exports into `out_dir`.
pub fn write_files(
    out_dir: &Path,
    model: &RasModel,
    suite: SuiteName,
    results: &[CheckResult],
    theme: ColorTheme,
    timestamp: &str,
) -> Result<WrittenFiles, ExportError> {
    fs::create_dir_all(out_dir).map_err(|e| ExportError::io(out_dir, e))?;
    let layers = write_geojson_layers(out_dir, results)?;
    let html_log = write_html_log(out_dir, model, suite, results, theme, timestamp)?;
    let grouped = summary::summarize(results);
    let summary_json = out_dir.join("rasqc_summary.json");
    summary::to_json_file(&grouped, &summary_json)?;
    let workbook = out_dir.join("rasqc_summary.xlsx");
    summary::to_workbook(&grouped, &workbook)?;
    Ok(WrittenFiles {
        html_log,
        layers,
        summary_json,
        workbook,
    })
}

/// One `FeatureCollection` per rule, merging the flags of all its results.
pub fn write_geojson_layers(
    out_dir: &Path,
    results: &[CheckResult],
) -> Result<Vec<PathBuf>, ExportError> {
    let mut by_rule: BTreeMap<&str, Vec<Json>> = BTreeMap::new();
    for r in results {
        let Some(flags) = r.spatial_flags.as_ref().filter(|f| !f.is_empty()) else {
            continue;
        };
        if let Json::Array(features) = &flags.to_geojson_value()["features"] {
            by_rule
                .entry(r.rule_name.as_str())
                .or_default()
                .extend(features.iter().cloned());
        }
    }
    let mut written = Vec::with_capacity(by_rule.len());
    for (rule, features) in by_rule {
        let path = out_dir.join(format!("{}.geojson", slug(rule)));
        let doc = json!({"type": "FeatureCollection", "features": features});
        let text = serde_json::to_string_pretty(&doc)?;
        fs::write(&path, text).map_err(|e| ExportError::io(&path, e))?;
        log::info!("wrote layer {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn html_log_path(out_dir: &Path, model: &RasModel) -> PathBuf {
    out_dir.join(format!("rasqc_{}.html", slug(model.title())))
}

pub fn write_html_log(
    out_dir: &Path,
    model: &RasModel,
    suite: SuiteName,
    results: &[CheckResult],
    theme: ColorTheme,
    timestamp: &str,
) -> Result<PathBuf, ExportError> {
    let path = html_log_path(out_dir, model);
    let html = render_html(out_dir, model, suite, results, theme, timestamp);
    fs::write(&path, html).map_err(|e| ExportError::io(&path, e))?;
    log::info!("wrote html log {}", path.display());
    Ok(path)
}

fn render_html(
    out_dir: &Path,
    model: &RasModel,
    suite: SuiteName,
    results: &[CheckResult],
    theme: ColorTheme,
    timestamp: &str,
) -> String {
    let p = theme.palette();
    let model_path = pathdiff::diff_paths(&model.project.path, out_dir)
        .unwrap_or_else(|| model.project.path.clone())
        .to_string_lossy()
        .to_string();
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    out.push_str(&format!("<title>rasqc: {}</title>", escape(model.title())));
    out.push_str(&format!(
        "<style>body{{background:{bg};color:{body};font-family:monospace;margin:2em}}\
h1{{color:{h1};text-shadow:2px 2px {shadow}}}h2{{color:{h2}}}\
td,th{{padding:2px 8px;text-align:left;vertical-align:top}}\
.error{{color:rgb(230,80,80)}}.warning{{color:rgb(230,200,60)}}.ok{{color:rgb(90,200,90)}}\
.note{{color:{h2}}}.skipped{{color:{shadow}}}</style></head><body>\n",
        bg = p.background,
        body = p.body,
        h1 = p.heading1,
        h2 = p.heading2,
        shadow = p.shadow,
    ));
    out.push_str(&format!("<h1>rasqc {}</h1>\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!(
        "<p>HEC-RAS Model: {}<br>Checksuite: {}<br>Timestamp: {}</p>\n",
        escape(model_path.as_str()),
        suite,
        escape(timestamp)
    ));
    out.push_str("<table>\n<tr><th>Status</th><th>Rule</th><th>File</th><th>Detail</th></tr>\n");
    for r in results {
        for (file, message) in r.pairs() {
            let detail = match message {
                Some(Json::String(s)) => s,
                Some(Json::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            out.push_str(&format!(
                "<tr class=\"{status}\"><td>{status}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(r.rule_name.as_str()),
                escape(file.as_str()),
                escape(detail.as_str()),
                status = r.status,
            ));
        }
    }
    out.push_str("</table>\n");
    let errors = results.iter().filter(|r| r.status == Status::Error).count();
    out.push_str(&format!("<h2>{} error(s)</h2>\n</body></html>\n", errors));
    out
}

/// Lowercase filesystem-safe token.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Feature, Geometry, SpatialFlags};
    use serde_json::Map;
    use tempfile::tempdir;

    fn flagged(rule: &str, n: usize) -> CheckResult {
        let features = (0..n)
            .map(|i| Feature {
                geometry: Geometry::Point([i as f64, 0.0]),
                properties: Map::new(),
            })
            .collect();
        CheckResult::error(rule, "m.g01.hdf", "flagged").with_spatial_flags(SpatialFlags::new(features))
    }

    #[test]
    fn test_report_json_shape() {
        let rs = vec![CheckResult::ok("Plan HDF Exists", "m.p01.hdf")];
        let v = compose_report_json("/m/m.prj", "ble", "2026-01-01T00:00:00Z", &rs);
        assert_eq!(v["checksuite"], "ble");
        assert_eq!(v["checks"][0]["status"], "ok");
        let again = compose_report_json("/m/m.prj", "ble", "2026-01-01T00:00:00Z", &rs);
        assert_eq!(v.to_string(), again.to_string());
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Arctic".parse::<ColorTheme>().unwrap(), ColorTheme::Arctic);
        assert_eq!("ninetys".parse::<ColorTheme>().unwrap(), ColorTheme::Nineties);
        assert!(matches!(
            "vapor".parse::<ColorTheme>(),
            Err(ConfigError::UnknownTheme(_))
        ));
    }

    #[test]
    fn test_layers_merge_per_rule() {
        let dir = tempdir().unwrap();
        let rs = vec![flagged("Short Cell Faces", 2), flagged("Short Cell Faces", 1), flagged("Other", 0)];
        let written = write_geojson_layers(dir.path(), &rs).unwrap();
        assert_eq!(written, vec![dir.path().join("short_cell_faces.geojson")]);
        let v: Json = serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(v["features"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_write_files_produces_log_and_exports() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("rasqc");
        let m = RasModel::builder(dir.path().join("dam.prj"), "Dam Break <Study>").build();
        let rs = vec![
            CheckResult::error("Project filename pattern", "dam.prj", "'dam.prj': bad & worse"),
            flagged("Short Cell Faces", 1),
        ];
        let files = write_files(&out, &m, SuiteName::Ffrd, &rs, ColorTheme::Adams, "now").unwrap();
        assert_eq!(files.html_log, out.join("rasqc_dam_break_study.html"));
        let html = fs::read_to_string(&files.html_log).unwrap();
        assert!(html.contains("rgb(82, 94, 100)"));
        assert!(html.contains("bad &amp; worse"));
        assert!(html.contains("../dam.prj"));
        assert_eq!(files.layers.len(), 1);
        assert!(files.workbook.is_file());
        assert!(files.summary_json.is_file());
    }
}
