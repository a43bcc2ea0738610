//! Uniform outcome record produced by every checker.
//!
//! A `CheckResult` is a passive record: constructing or serializing it never
//! fails. `target` and `message` are sum types so that checkers reporting one
//! fact per file can do so without runtime type inspection downstream.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
/// Disposition of a single result.
///
/// `Note` is informational and always passing. `Skipped` is emitted by the
/// orchestrator only, for checkers whose dependencies did not pass.
pub enum Status {
    Ok,
    Warning,
    Error,
    Note,
    Skipped,
}

impl Status {
    /// Canonical lowercase token used in every serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Error => "error",
            Status::Note => "note",
            Status::Skipped => "skipped",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
/// File (or files) a result speaks about.
pub enum Target {
    File(String),
    Files(Vec<String>),
}

impl Target {
    /// Filenames in positional order.
    pub fn files(&self) -> Vec<&str> {
        match self {
            Target::File(f) => vec![f.as_str()],
            Target::Files(fs) => fs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::File(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::File(s)
    }
}

impl From<Vec<String>> for Target {
    fn from(v: Vec<String>) -> Self {
        Target::Files(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
/// One element of a list-valued message.
pub enum MessageItem {
    Text(String),
    Structured(Map<String, Json>),
}

impl MessageItem {
    pub fn to_json(&self) -> Json {
        match self {
            MessageItem::Text(s) => Json::String(s.clone()),
            MessageItem::Structured(m) => Json::Object(m.clone()),
        }
    }
}

impl From<&str> for MessageItem {
    fn from(s: &str) -> Self {
        MessageItem::Text(s.to_string())
    }
}

impl From<String> for MessageItem {
    fn from(s: String) -> Self {
        MessageItem::Text(s)
    }
}

impl From<Map<String, Json>> for MessageItem {
    fn from(m: Map<String, Json>) -> Self {
        MessageItem::Structured(m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
/// Human-facing detail attached to a result. Absence is `Option::None` on
/// the result itself.
pub enum Message {
    Text(String),
    Structured(Map<String, Json>),
    List(Vec<MessageItem>),
}

impl Message {
    /// Plain text rendering used by console narration.
    pub fn render(&self) -> String {
        match self {
            Message::Text(s) => s.clone(),
            Message::Structured(m) => Json::Object(m.clone()).to_string(),
            Message::List(items) => items
                .iter()
                .map(|i| match i {
                    MessageItem::Text(s) => s.clone(),
                    MessageItem::Structured(m) => Json::Object(m.clone()).to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<Map<String, Json>> for Message {
    fn from(m: Map<String, Json>) -> Self {
        Message::Structured(m)
    }
}

impl From<Vec<MessageItem>> for Message {
    fn from(v: Vec<MessageItem>) -> Self {
        Message::List(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
/// Illustrative examples attached to schema failures: one list for a single
/// schema, or one list per candidate for any-of validation.
pub enum Examples {
    Single(Vec<Json>),
    PerCandidate(Vec<Vec<Json>>),
}

#[derive(Debug, Clone, PartialEq)]
/// Planar geometry of a flagged feature, in model coordinates.
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    fn to_json(&self) -> Json {
        match self {
            Geometry::Point(p) => json!({"type": "Point", "coordinates": p}),
            Geometry::LineString(l) => json!({"type": "LineString", "coordinates": l}),
            Geometry::Polygon(rings) => json!({"type": "Polygon", "coordinates": rings}),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A flagged feature with free-form attributes.
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Collection of spatially-locatable problems attached to a result.
pub struct SpatialFlags {
    pub features: Vec<Feature>,
}

impl SpatialFlags {
    pub fn new(features: Vec<Feature>) -> Self {
        SpatialFlags { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// GeoJSON `FeatureCollection` value.
    pub fn to_geojson_value(&self) -> Json {
        let features: Vec<Json> = self
            .features
            .iter()
            .map(|f| {
                json!({
                    "type": "Feature",
                    "properties": f.properties,
                    "geometry": f.geometry.to_json(),
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features})
    }

    /// GeoJSON text, the form embedded in serialized results.
    pub fn to_geojson(&self) -> String {
        self.to_geojson_value().to_string()
    }
}

fn serialize_flags<S: Serializer>(flags: &Option<SpatialFlags>, s: S) -> Result<S::Ok, S::Error> {
    match flags {
        Some(f) => s.serialize_str(&f.to_geojson()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Outcome of one checker against one file or element.
pub struct CheckResult {
    pub status: Status,
    pub rule_name: String,
    pub target: Target,
    pub message: Option<Message>,
    pub matched_element: Option<String>,
    pub pattern: Option<String>,
    pub pattern_description: Option<String>,
    pub examples: Option<Examples>,
    #[serde(serialize_with = "serialize_flags")]
    pub spatial_flags: Option<SpatialFlags>,
}

impl CheckResult {
    pub fn new(status: Status, rule_name: impl Into<String>, target: impl Into<Target>) -> Self {
        CheckResult {
            status,
            rule_name: rule_name.into(),
            target: target.into(),
            message: None,
            matched_element: None,
            pattern: None,
            pattern_description: None,
            examples: None,
            spatial_flags: None,
        }
    }

    pub fn ok(rule_name: impl Into<String>, target: impl Into<Target>) -> Self {
        Self::new(Status::Ok, rule_name, target)
    }

    pub fn warning(
        rule_name: impl Into<String>,
        target: impl Into<Target>,
        message: impl Into<Message>,
    ) -> Self {
        Self::new(Status::Warning, rule_name, target).with_message(message)
    }

    pub fn error(
        rule_name: impl Into<String>,
        target: impl Into<Target>,
        message: impl Into<Message>,
    ) -> Self {
        Self::new(Status::Error, rule_name, target).with_message(message)
    }

    pub fn note(
        rule_name: impl Into<String>,
        target: impl Into<Target>,
        message: impl Into<Message>,
    ) -> Self {
        Self::new(Status::Note, rule_name, target).with_message(message)
    }

    /// One aggregate result over several files, pairing each file with its
    /// message item. Parallel by construction.
    pub fn per_file(
        status: Status,
        rule_name: impl Into<String>,
        entries: Vec<(String, MessageItem)>,
    ) -> Self {
        let (files, items): (Vec<String>, Vec<MessageItem>) = entries.into_iter().unzip();
        Self::new(status, rule_name, Target::Files(files)).with_message(Message::List(items))
    }

    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.matched_element = Some(element.into());
        self
    }

    pub fn with_pattern(
        mut self,
        pattern: Option<String>,
        description: Option<String>,
        examples: Option<Examples>,
    ) -> Self {
        self.pattern = pattern;
        self.pattern_description = description;
        self.examples = examples;
        self
    }

    pub fn with_spatial_flags(mut self, flags: SpatialFlags) -> Self {
        self.spatial_flags = Some(flags);
        self
    }

    /// When `target` lists N files and `message` is a list, the list must
    /// also hold N items.
    pub fn is_parallel(&self) -> bool {
        match (&self.target, &self.message) {
            (Target::Files(files), Some(Message::List(items))) => files.len() == items.len(),
            (Target::File(_), Some(Message::List(items))) => items.len() == 1,
            _ => true,
        }
    }

    /// Positional (file, message) pairs. Scalar messages are repeated for
    /// every file of a list target.
    pub fn pairs(&self) -> Vec<(String, Option<Json>)> {
        let files = self.target.files();
        match &self.message {
            Some(Message::List(items)) => files
                .iter()
                .enumerate()
                .map(|(i, f)| (f.to_string(), items.get(i).map(MessageItem::to_json)))
                .collect(),
            Some(Message::Text(s)) => files
                .iter()
                .map(|f| (f.to_string(), Some(Json::String(s.clone()))))
                .collect(),
            Some(Message::Structured(m)) => files
                .iter()
                .map(|f| (f.to_string(), Some(Json::Object(m.clone()))))
                .collect(),
            None => files.iter().map(|f| (f.to_string(), None)).collect(),
        }
    }

    /// JSON mapping with the status token and GeoJSON-encoded flags.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_result_serializes_with_absent_fields() {
        let r = CheckResult::ok("Volume Accounting Error", "m.p18.hdf");
        let v = r.to_json();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["rule_name"], "Volume Accounting Error");
        assert_eq!(v["target"], "m.p18.hdf");
        assert!(v["message"].is_null());
        assert!(v["spatial_flags"].is_null());
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "status");
        assert_eq!(keys.len(), 9);
    }

    #[test]
    fn test_status_tokens() {
        assert_eq!(Status::Warning.to_string(), "warning");
        assert_eq!(serde_json::to_value(Status::Note).unwrap(), "note");
        assert_eq!(serde_json::to_value(Status::Skipped).unwrap(), "skipped");
    }

    #[test]
    fn test_spatial_flags_become_geojson_text() {
        let flags = SpatialFlags::new(vec![Feature {
            geometry: Geometry::LineString(vec![[0.0, 0.0], [3.0, 4.0]]),
            properties: Map::new(),
        }]);
        let r = CheckResult::error("Short Cell Faces", "g.hdf", "1 short cell faces found")
            .with_spatial_flags(flags);
        let v = r.to_json();
        let text = v["spatial_flags"].as_str().unwrap();
        let parsed: Json = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"][0]["geometry"]["type"], "LineString");
    }

    #[test]
    fn test_per_file_is_parallel_and_pairs_by_position() {
        let mut m = Map::new();
        m.insert("BaldEagleCr".into(), json!("Diffusion Wave"));
        let r = CheckResult::per_file(
            Status::Note,
            "2D Equation Set",
            vec![
                ("a.p13.hdf".into(), "a.p13.hdf does not exist".into()),
                ("a.p18.hdf".into(), m.into()),
            ],
        );
        assert!(r.is_parallel());
        let pairs = r.pairs();
        assert_eq!(pairs[0].0, "a.p13.hdf");
        assert_eq!(pairs[1].1.as_ref().unwrap()["BaldEagleCr"], "Diffusion Wave");
    }

    #[test]
    fn test_mismatched_list_lengths_are_detected() {
        let r = CheckResult::new(
            Status::Note,
            "Computation Settings",
            vec!["a".to_string(), "b".to_string()],
        )
        .with_message(vec![MessageItem::from("only one")]);
        assert!(!r.is_parallel());
    }

    #[test]
    fn test_render_list_message() {
        let msg = Message::List(vec!["x".into(), "y".into()]);
        assert_eq!(msg.render(), "x; y");
    }
}
