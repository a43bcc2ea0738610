//! Grouping of results by outcome, rule and file, plus the flat exports
//! built from it (summary JSON and a two-sheet workbook).

use crate::error::ExportError;
use crate::result::{CheckResult, Status};
use quick_xml::escape::escape;
use serde::Serialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// rule name -> target filename -> collected values
pub type RuleGroups = BTreeMap<String, BTreeMap<String, Vec<String>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// OK and WARNING results.
    pub passed: RuleGroups,
    /// ERROR results.
    pub failed: RuleGroups,
    pub notes: RuleGroups,
    pub skipped: RuleGroups,
}

/// One row of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub rule_name: String,
    pub file_name: String,
    pub value: String,
}

const NO_VALUE: &str = "N/A";

/// Partition results and pair every target file with its value.
pub fn summarize(results: &[CheckResult]) -> Summary {
    let mut summary = Summary::default();
    for r in results {
        let group = match r.status {
            Status::Ok | Status::Warning => &mut summary.passed,
            Status::Error => &mut summary.failed,
            Status::Note => &mut summary.notes,
            Status::Skipped => &mut summary.skipped,
        };
        let by_file = group.entry(r.rule_name.clone()).or_default();
        for (file, message) in r.pairs() {
            let value = match (&r.matched_element, message) {
                (Some(element), _) => element.clone(),
                (None, Some(Json::String(s))) => s,
                (None, Some(Json::Null)) | (None, None) => NO_VALUE.to_string(),
                (None, Some(other)) => other.to_string(),
            };
            by_file.entry(file).or_default().push(value);
        }
    }
    summary
}

impl Summary {
    /// Flatten one group into rows ordered by rule, then file.
    pub fn rows(group: &RuleGroups) -> Vec<Row> {
        let mut rows = Vec::new();
        for (rule, files) in group {
            for (file, values) in files {
                for value in values {
                    rows.push(Row {
                        rule_name: rule.clone(),
                        file_name: file.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        rows
    }

    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

pub fn to_json_file(summary: &Summary, path: &Path) -> Result<(), ExportError> {
    let text = serde_json::to_string_pretty(summary)?;
    fs::write(path, text + "\n").map_err(|e| ExportError::io(path, e))?;
    log::info!("wrote summary json {}", path.display());
    Ok(())
}

/// Write a `.xlsx` with sheets `failed` then `passed`, each with the
/// columns `Rule Name | File Name | Value`.
pub fn to_workbook(summary: &Summary, path: &Path) -> Result<(), ExportError> {
    let file = fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let sheets = [
        ("failed", Summary::rows(&summary.failed)),
        ("passed", Summary::rows(&summary.passed)),
    ];

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types(sheets.len())),
        ("_rels/.rels".into(), ROOT_RELS.to_string()),
        ("xl/workbook.xml".into(), workbook_xml(&sheets.iter().map(|s| s.0).collect::<Vec<_>>())),
        ("xl/_rels/workbook.xml.rels".into(), workbook_rels(sheets.len())),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(rows)));
    }
    for (name, body) in parts {
        zip.start_file(name, opts)?;
        zip.write_all(body.as_bytes())
            .map_err(|e| ExportError::io(path, e))?;
    }
    zip.finish()?;
    log::info!("wrote summary workbook {}", path.display());
    Ok(())
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

fn content_types(sheets: usize) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheets {
        s.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    s.push_str("</Types>");
    s
}

fn workbook_xml(names: &[&str]) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for (i, name) in names.iter().enumerate() {
        s.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(*name),
            i + 1,
            i + 1
        ));
    }
    s.push_str("</sheets></workbook>");
    s
}

fn workbook_rels(sheets: usize) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheets {
        s.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    s.push_str("</Relationships>");
    s
}

fn sheet_xml(rows: &[Row]) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let header = ["Rule Name", "File Name", "Value"];
    push_row(&mut s, 1, &header);
    for (i, row) in rows.iter().enumerate() {
        push_row(
            &mut s,
            i + 2,
            &[row.rule_name.as_str(), row.file_name.as_str(), row.value.as_str()],
        );
    }
    s.push_str("</sheetData></worksheet>");
    s
}

fn push_row(out: &mut String, n: usize, cells: &[&str]) {
    out.push_str(&format!(r#"<row r="{}">"#, n));
    for (col, text) in ["A", "B", "C"].iter().zip(cells) {
        out.push_str(&format!(
            r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            col,
            n,
            escape(*text)
        ));
    }
    out.push_str("</row>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::MessageItem;
    use std::io::Read;
    use tempfile::tempdir;

    fn sample() -> Vec<CheckResult> {
        vec![
            CheckResult::ok("Plan title pattern", "m.p01").with_element("storm:2024-01-15"),
            CheckResult::error("Plan title pattern", "m.p02", "'bad': nope").with_element("bad"),
            CheckResult::warning("2D Equation Set", "m.p01.hdf", "SWE-ELM <x>"),
            CheckResult::per_file(
                Status::Note,
                "Computation Settings",
                vec![
                    ("m.p01.hdf".into(), MessageItem::from("a")),
                    ("m.p02.hdf".into(), MessageItem::from("b")),
                ],
            ),
            CheckResult::ok("Plan HDF Exists", "m.p01.hdf"),
            CheckResult::new(Status::Skipped, "Volume Accounting Error", "m.prj")
                .with_message("Skipped"),
        ]
    }

    #[test]
    fn test_summarize_partitions_and_zips_pairs() {
        let s = summarize(&sample());
        assert_eq!(s.passed["Plan title pattern"]["m.p01"], vec!["storm:2024-01-15"]);
        assert_eq!(s.failed["Plan title pattern"]["m.p02"], vec!["bad"]);
        assert_eq!(s.passed["2D Equation Set"]["m.p01.hdf"], vec!["SWE-ELM <x>"]);
        assert_eq!(s.passed["Plan HDF Exists"]["m.p01.hdf"], vec!["N/A"]);
        assert_eq!(s.notes["Computation Settings"]["m.p02.hdf"], vec!["b"]);
        assert!(s.skipped.contains_key("Volume Accounting Error"));
        assert!(!s.failed.contains_key("Computation Settings"));
    }

    #[test]
    fn test_rows_are_ordered() {
        let s = summarize(&sample());
        let rows = Summary::rows(&s.passed);
        assert_eq!(rows[0].rule_name, "2D Equation Set");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_workbook_has_failed_then_passed_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.xlsx");
        to_workbook(&summarize(&sample()), &path).unwrap();
        let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
        let mut wb = String::new();
        archive
            .by_name("xl/workbook.xml")
            .unwrap()
            .read_to_string(&mut wb)
            .unwrap();
        let failed = wb.find("name=\"failed\"").unwrap();
        let passed = wb.find("name=\"passed\"").unwrap();
        assert!(failed < passed);
        let mut sheet2 = String::new();
        archive
            .by_name("xl/worksheets/sheet2.xml")
            .unwrap()
            .read_to_string(&mut sheet2)
            .unwrap();
        assert!(sheet2.contains("Rule Name"));
        assert!(sheet2.contains("SWE-ELM &lt;x&gt;"));
    }

    #[test]
    fn test_summary_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        to_json_file(&summarize(&sample()), &path).unwrap();
        let v: Json = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["failed"]["Plan title pattern"]["m.p02"][0], "bad");
    }
}
