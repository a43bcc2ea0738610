//! Convention schema loading and schema-driven value validation.
//!
//! The schema is a JSON document whose `properties` map a property name to
//! a rule: `pattern`, `enum`, `const`, `type`, `minLength`, `maxLength`, plus
//! a `description` and `examples`. Patterns are compiled once at load. A
//! loaded schema is read-only for the life of the process.
//!
//! Validation comes in two modes:
//! - single: one property, failure carries that property's diagnostics;
//! - any-of: ordered candidate properties, first match wins, failure carries
//!   every candidate's pattern and examples.

use crate::checker::CheckError;
use crate::error::ConfigError;
use crate::result::{CheckResult, Examples, Status, Target};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

const BUNDLED_SCHEMA: &str = include_str!("../data/naming-schema.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
/// JSON value kinds accepted by the `type` keyword.
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueKind {
    fn accepts(&self, v: &Json) -> bool {
        match self {
            ValueKind::String => v.is_string(),
            ValueKind::Number => v.is_number(),
            ValueKind::Integer => v.is_i64() || v.is_u64(),
            ValueKind::Boolean => v.is_boolean(),
            ValueKind::Array => v.is_array(),
            ValueKind::Object => v.is_object(),
            ValueKind::Null => v.is_null(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Constraint set for one schema property.
pub struct PropertyRule {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<Json>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default, rename = "enum")]
    pub allowed: Option<Vec<Json>>,
    #[serde(default, rename = "const")]
    pub constant: Option<Json>,
    #[serde(default, rename = "type")]
    pub kind: Option<ValueKind>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(skip)]
    compiled: Option<Regex>,
}

impl PropertyRule {
    /// True when `value` satisfies every constraint present on the rule.
    /// String-only keywords are ignored for non-string values.
    pub fn matches(&self, value: &Json) -> bool {
        if let Some(kind) = self.kind {
            if !kind.accepts(value) {
                return false;
            }
        }
        if let Some(c) = &self.constant {
            if c != value {
                return false;
            }
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                return false;
            }
        }
        if let Json::String(s) = value {
            let len = s.chars().count();
            if self.min_length.is_some_and(|min| len < min) {
                return false;
            }
            if self.max_length.is_some_and(|max| len > max) {
                return false;
            }
            if let Some(re) = &self.compiled {
                if !re.is_match(s) {
                    return false;
                }
            }
        }
        true
    }

    /// Textual form of the constraint, used in diagnostics.
    pub fn constraint_text(&self) -> String {
        if let Some(p) = &self.pattern {
            return p.clone();
        }
        if let Some(allowed) = &self.allowed {
            let vals: Vec<String> = allowed.iter().map(display_value).collect();
            return format!("one of [{}]", vals.join(", "));
        }
        if let Some(c) = &self.constant {
            return format!("exactly {}", display_value(c));
        }
        match self.kind {
            Some(k) => format!("{:?}", k).to_lowercase(),
            None => "any".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, PropertyRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the schema document comes from.
pub enum SchemaSource {
    Bundled,
    File(PathBuf),
    Url(String),
}

impl FromStr for SchemaSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(if s.is_empty() || s.eq_ignore_ascii_case("bundled") {
            SchemaSource::Bundled
        } else if s.starts_with("http://") || s.starts_with("https://") {
            SchemaSource::Url(s.to_string())
        } else {
            SchemaSource::File(PathBuf::from(s.strip_prefix("file:").unwrap_or(s)))
        })
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Bundled => f.write_str("bundled naming schema"),
            SchemaSource::File(p) => write!(f, "{}", p.display()),
            SchemaSource::Url(u) => f.write_str(u),
        }
    }
}

#[derive(Debug, Clone)]
/// Loaded, compiled convention schema.
pub struct ConventionSchema {
    version: Option<String>,
    properties: BTreeMap<String, PropertyRule>,
}

impl ConventionSchema {
    /// Parse a schema document and compile its patterns.
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: RawSchema = serde_json::from_str(text).map_err(|e| ConfigError::SchemaLoad {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        let mut properties = raw.properties;
        for (name, rule) in properties.iter_mut() {
            if let Some(p) = &rule.pattern {
                let re = Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                    property: name.clone(),
                    source,
                })?;
                rule.compiled = Some(re);
            }
        }
        log::debug!(
            "loaded convention schema from {} ({} properties)",
            origin,
            properties.len()
        );
        Ok(ConventionSchema {
            version: raw.version,
            properties,
        })
    }

    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json_str(BUNDLED_SCHEMA, "bundled naming schema")
    }

    /// Load from the configured source. Any failure is a startup error.
    pub fn load(source: &SchemaSource) -> Result<Self, ConfigError> {
        let origin = source.to_string();
        let text = match source {
            SchemaSource::Bundled => return Self::bundled(),
            SchemaSource::File(path) => {
                std::fs::read_to_string(path).map_err(|e| ConfigError::SchemaLoad {
                    origin: origin.clone(),
                    message: e.to_string(),
                })?
            }
            SchemaSource::Url(url) => fetch_url(url)?,
        };
        Self::from_json_str(&text, &origin)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyRule> {
        self.properties.get(name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Every example must validate against its own property. Returns the
    /// number of examples exercised.
    pub fn self_test(&self) -> Result<usize, ConfigError> {
        let mut checked = 0usize;
        for (name, rule) in &self.properties {
            for example in &rule.examples {
                if !rule.matches(&normalize(example)) {
                    return Err(ConfigError::SchemaSelfTest {
                        property: name.clone(),
                        example: display_value(example),
                    });
                }
                checked += 1;
            }
        }
        log::debug!("convention schema self-test passed ({} examples)", checked);
        Ok(checked)
    }

    /// Validate `value` against one property.
    pub fn validate(
        &self,
        property: &str,
        value: &Json,
        rule_name: &str,
        target: impl Into<Target>,
    ) -> Result<CheckResult, CheckError> {
        let rule = self
            .property(property)
            .ok_or_else(|| CheckError::MissingSchemaProperty(property.to_string()))?;
        let candidate = normalize(value);
        let shown = display_value(&candidate);
        if rule.matches(&candidate) {
            return Ok(CheckResult::ok(rule_name, target).with_element(shown));
        }
        let description = rule
            .description
            .clone()
            .unwrap_or_else(|| format!("expected to match {}", rule.constraint_text()));
        Ok(CheckResult::new(Status::Error, rule_name, target)
            .with_message(format!("'{}': {}", shown, description))
            .with_element(shown)
            .with_pattern(
                Some(rule.constraint_text()),
                rule.description.clone(),
                Some(Examples::Single(rule.examples.clone())),
            ))
    }

    /// Validate `value` against candidate properties in order; first match
    /// wins. On total failure every candidate's pattern and examples are
    /// attached.
    pub fn validate_any(
        &self,
        properties: &[&str],
        value: &Json,
        rule_name: &str,
        target: impl Into<Target>,
    ) -> Result<CheckResult, CheckError> {
        let mut rules = Vec::with_capacity(properties.len());
        for p in properties {
            let rule = self
                .property(p)
                .ok_or_else(|| CheckError::MissingSchemaProperty(p.to_string()))?;
            rules.push(rule);
        }
        let candidate = normalize(value);
        let shown = display_value(&candidate);
        if rules.iter().any(|r| r.matches(&candidate)) {
            return Ok(CheckResult::ok(rule_name, target).with_element(shown));
        }
        let patterns: Vec<String> = rules.iter().map(|r| r.constraint_text()).collect();
        let descriptions: Vec<String> = rules.iter().filter_map(|r| r.description.clone()).collect();
        let examples: Vec<Vec<Json>> = rules.iter().map(|r| r.examples.clone()).collect();
        Ok(CheckResult::new(Status::Error, rule_name, target)
            .with_message(format!(
                "'{}' does not match any of the expected patterns.",
                shown
            ))
            .with_element(shown)
            .with_pattern(
                Some(patterns.join(" | ")),
                (!descriptions.is_empty()).then(|| descriptions.join(" OR ")),
                Some(Examples::PerCandidate(examples)),
            ))
    }
}

/// Reduce a candidate to the value matched by the pattern engine.
///
/// A mapping yields its first value (insertion order; with several keys the
/// choice is not otherwise defined). Strings are trimmed. Anything else
/// passes through unchanged.
pub fn normalize(value: &Json) -> Json {
    match value {
        Json::String(s) => Json::String(s.trim().to_string()),
        Json::Object(map) => match first_value(map) {
            Some(inner) => normalize(inner),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

fn first_value(map: &Map<String, Json>) -> Option<&Json> {
    if map.len() > 1 {
        log::warn!(
            "nested value has {} keys; validating the first one only",
            map.len()
        );
    }
    map.values().next()
}

fn display_value(v: &Json) -> String {
    match v {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fetch_url(url: &str) -> Result<String, ConfigError> {
    let err = |message: String| ConfigError::SchemaLoad {
        origin: url.to_string(),
        message,
    };
    log::info!("fetching convention schema from {}", url);
    let out = Command::new("curl")
        .args(["-fsSL", "--max-time", "30", url])
        .output()
        .map_err(|e| err(format!("could not run curl: {}", e)))?;
    if !out.status.success() {
        return Err(err(String::from_utf8_lossy(&out.stderr).trim().to_string()));
    }
    String::from_utf8(out.stdout).map_err(|e| err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ConventionSchema {
        ConventionSchema::from_json_str(
            r#"{
              "properties": {
                "prj_filename": {
                  "type": "string",
                  "pattern": "^[a-z0-9-]+\\.prj$",
                  "description": "Project filename must be lowercase letters, digits and hyphens",
                  "examples": ["bald-eagle.prj"]
                },
                "plan_title": {
                  "pattern": "^[a-z-]+:\\d{4}-\\d{2}-\\d{2}$",
                  "description": "hydra-event-type:YYYY-MM-DD",
                  "examples": ["synthetic:2024-01-01"]
                },
                "plan_title_legacy": {
                  "pattern": "^[A-Z][a-z]{2}\\d{4} .+$",
                  "description": "MonYEAR Event",
                  "examples": ["Jan2023 100yr"]
                },
                "units": { "enum": ["Feet", "Meters"], "examples": ["Feet"] },
                "cell_count": { "type": "integer", "examples": [12] }
              }
            }"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_bundled_schema_passes_self_test() {
        let s = ConventionSchema::bundled().unwrap();
        assert!(s.self_test().unwrap() > 0);
    }

    #[test]
    fn test_single_failure_carries_pattern_and_examples() {
        let r = schema()
            .validate("prj_filename", &json!("BaldEagleDamBrk.prj"), "Project filename pattern", "BaldEagleDamBrk.prj")
            .unwrap();
        assert_eq!(r.status, Status::Error);
        let msg = r.message.unwrap().render();
        assert!(msg.contains("BaldEagleDamBrk.prj"));
        assert!(msg.contains("lowercase letters, digits and hyphens"));
        assert_eq!(r.pattern.as_deref(), Some("^[a-z0-9-]+\\.prj$"));
        assert_eq!(r.examples, Some(Examples::Single(vec![json!("bald-eagle.prj")])));
    }

    #[test]
    fn test_strings_are_trimmed_before_matching() {
        let r = schema()
            .validate("prj_filename", &json!("  bald-eagle.prj \n"), "p", "x")
            .unwrap();
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.matched_element.as_deref(), Some("bald-eagle.prj"));
        assert!(r.pattern.is_none());
    }

    #[test]
    fn test_any_of_second_candidate_matches_without_payload() {
        let r = schema()
            .validate_any(&["plan_title", "plan_title_legacy"], &json!("Jan2023 100yr"), "Plan title", "m.p01")
            .unwrap();
        assert_eq!(r.status, Status::Ok);
        assert!(r.pattern.is_none());
        assert!(r.examples.is_none());
        assert!(r.message.is_none());
    }

    #[test]
    fn test_any_of_failure_aggregates_all_candidates() {
        let r = schema()
            .validate_any(&["plan_title", "plan_title_legacy"], &json!("2D to 2D Run"), "Plan title", "m.p18")
            .unwrap();
        assert_eq!(r.status, Status::Error);
        let pattern = r.pattern.unwrap();
        assert!(pattern.contains("^[a-z-]+:\\d{4}-\\d{2}-\\d{2}$"));
        assert!(pattern.contains("^[A-Z][a-z]{2}\\d{4} .+$"));
        match r.examples.unwrap() {
            Examples::PerCandidate(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected examples {:?}", other),
        }
        let msg = r.message.unwrap().render();
        assert_eq!(msg.matches("2D to 2D Run").count(), 1);
    }

    #[test]
    fn test_nested_mapping_uses_embedded_value() {
        let r = schema()
            .validate("prj_filename", &json!({"Upper 2D Area": " ok-name.prj "}), "p", "x")
            .unwrap();
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.matched_element.as_deref(), Some("ok-name.prj"));
    }

    #[test]
    fn test_enum_and_type_constraints() {
        let s = schema();
        assert_eq!(s.validate("units", &json!("Feet"), "u", "x").unwrap().status, Status::Ok);
        let bad = s.validate("units", &json!("Inches"), "u", "x").unwrap();
        assert_eq!(bad.status, Status::Error);
        assert_eq!(bad.pattern.as_deref(), Some("one of [Feet, Meters]"));
        assert_eq!(s.validate("cell_count", &json!(7), "c", "x").unwrap().status, Status::Ok);
        assert_eq!(s.validate("cell_count", &json!("7"), "c", "x").unwrap().status, Status::Error);
    }

    #[test]
    fn test_missing_property_is_a_checker_fault() {
        let err = schema().validate("nope", &json!("x"), "r", "t").unwrap_err();
        assert!(matches!(err, CheckError::MissingSchemaProperty(_)));
    }

    #[test]
    fn test_invalid_pattern_fails_load() {
        let err = ConventionSchema::from_json_str(
            r#"{"properties": {"bad": {"pattern": "([a-z"}}}"#,
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_self_test_rejects_bad_example() {
        let s = ConventionSchema::from_json_str(
            r#"{"properties": {"p": {"pattern": "^[a-z]+$", "examples": ["Upper"]}}}"#,
            "test",
        )
        .unwrap();
        assert!(matches!(
            s.self_test(),
            Err(ConfigError::SchemaSelfTest { .. })
        ));
    }

    #[test]
    fn test_schema_source_parsing() {
        assert_eq!("bundled".parse::<SchemaSource>().unwrap(), SchemaSource::Bundled);
        assert_eq!(
            "https://example.org/s.json".parse::<SchemaSource>().unwrap(),
            SchemaSource::Url("https://example.org/s.json".into())
        );
        assert_eq!(
            "file:conv/s.json".parse::<SchemaSource>().unwrap(),
            SchemaSource::File(PathBuf::from("conv/s.json"))
        );
    }
}
