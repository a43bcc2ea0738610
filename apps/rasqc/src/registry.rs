//! Named check suites and the registry that owns them.
//!
//! The registry is an explicit value built once at startup from a static
//! table of registrations. Every registration problem (unknown suite,
//! dependency that is not registered earlier in the same suite, checker
//! requiring a schema property the schema lacks) is a `ConfigError` raised
//! while building, never a silent skip at run time.

use crate::checker::Checker;
use crate::error::ConfigError;
use crate::schema::ConventionSchema;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// The fixed set of known suites.
pub enum SuiteName {
    Ffrd,
    Ble,
}

impl SuiteName {
    pub const ALL: [SuiteName; 2] = [SuiteName::Ffrd, SuiteName::Ble];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteName::Ffrd => "ffrd",
            SuiteName::Ble => "ble",
        }
    }

    fn known() -> String {
        SuiteName::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for SuiteName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SuiteName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownSuite {
                name: s.to_string(),
                known: SuiteName::known(),
            })
    }
}

impl fmt::Display for SuiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds one checker instance; receives the loaded schema.
pub type Factory = fn(&Arc<ConventionSchema>) -> Arc<dyn Checker>;

/// One row of the static registration table.
pub struct Registration {
    pub factory: Factory,
    pub suites: &'static [&'static str],
    pub dependencies: &'static [&'static str],
}

#[derive(Clone)]
/// A checker bound into a suite together with its dependency gate.
pub struct SuiteEntry {
    pub checker: Arc<dyn Checker>,
    pub dependencies: Vec<String>,
}

impl fmt::Debug for SuiteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteEntry")
            .field("id", &self.checker.id())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[derive(Debug, Clone)]
/// Ordered collection of checkers run together. Append-only.
pub struct CheckSuite {
    name: SuiteName,
    entries: Vec<SuiteEntry>,
}

impl CheckSuite {
    pub fn new(name: SuiteName) -> Self {
        CheckSuite {
            name,
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> SuiteName {
        self.name
    }

    pub fn entries(&self) -> &[SuiteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.checker.id() == id)
    }

    /// Append a checker. Dependencies must already be in the suite, which
    /// keeps registration order a valid execution order.
    pub fn add(&mut self, checker: Arc<dyn Checker>, dependencies: &[&str]) -> Result<(), ConfigError> {
        if self.contains(checker.id()) {
            return Err(ConfigError::DuplicateChecker {
                checker: checker.id().to_string(),
                suite: self.name.to_string(),
            });
        }
        for dep in dependencies {
            if !self.contains(dep) {
                return Err(ConfigError::UnknownDependency {
                    checker: checker.id().to_string(),
                    dependency: dep.to_string(),
                    suite: self.name.to_string(),
                });
            }
        }
        self.entries.push(SuiteEntry {
            checker,
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        });
        Ok(())
    }
}

/// All known suites, keyed by exact name.
pub struct Registry {
    schema: Arc<ConventionSchema>,
    suites: BTreeMap<SuiteName, CheckSuite>,
}

impl Registry {
    /// Empty registry with every known suite present.
    pub fn new(schema: Arc<ConventionSchema>) -> Self {
        let suites = SuiteName::ALL
            .into_iter()
            .map(|n| (n, CheckSuite::new(n)))
            .collect();
        Registry { schema, suites }
    }

    /// Registry populated from the built-in registration table.
    pub fn with_builtins(schema: Arc<ConventionSchema>) -> Result<Self, ConfigError> {
        let mut reg = Registry::new(schema);
        reg.register_all(&crate::checkers::registrations())?;
        Ok(reg)
    }

    pub fn schema(&self) -> &Arc<ConventionSchema> {
        &self.schema
    }

    /// Bind one checker instance into each named suite. Names are resolved
    /// before anything is mutated, so a failed call leaves no partial state.
    pub fn register(
        &mut self,
        suite_names: &[&str],
        checker: Arc<dyn Checker>,
        dependencies: &[&str],
    ) -> Result<(), ConfigError> {
        let names = suite_names
            .iter()
            .map(|s| s.parse::<SuiteName>())
            .collect::<Result<Vec<_>, _>>()?;
        for property in checker.required_properties() {
            if self.schema.property(property).is_none() {
                return Err(ConfigError::MissingSchemaProperty {
                    property: property.to_string(),
                    checker: checker.id().to_string(),
                });
            }
        }
        for name in &names {
            let suite = &self.suites[name];
            if suite.contains(checker.id()) {
                return Err(ConfigError::DuplicateChecker {
                    checker: checker.id().to_string(),
                    suite: name.to_string(),
                });
            }
            for dep in dependencies {
                if !suite.contains(dep) {
                    return Err(ConfigError::UnknownDependency {
                        checker: checker.id().to_string(),
                        dependency: dep.to_string(),
                        suite: name.to_string(),
                    });
                }
            }
        }
        for name in names {
            if let Some(suite) = self.suites.get_mut(&name) {
                suite.add(Arc::clone(&checker), dependencies)?;
                log::debug!("registered checker '{}' in suite '{}'", checker.id(), name);
            }
        }
        Ok(())
    }

    pub fn register_all(&mut self, table: &[Registration]) -> Result<(), ConfigError> {
        for reg in table {
            let checker = (reg.factory)(&self.schema);
            self.register(reg.suites, checker, reg.dependencies)?;
        }
        log::info!(
            "check registry ready: {}",
            self.suites
                .values()
                .map(|s| format!("{}={}", s.name(), s.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&CheckSuite, ConfigError> {
        let key = name.parse::<SuiteName>()?;
        self.suites.get(&key).ok_or_else(|| ConfigError::UnknownSuite {
            name: name.to_string(),
            known: SuiteName::known(),
        })
    }

    pub fn suites(&self) -> impl Iterator<Item = &CheckSuite> {
        self.suites.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CheckError, Evaluation};
    use crate::model::RasModel;
    use crate::result::CheckResult;

    struct Named(&'static str, Vec<&'static str>);

    impl Checker for Named {
        fn id(&self) -> &'static str {
            self.0
        }
        fn name(&self) -> &'static str {
            self.0
        }
        fn required_properties(&self) -> Vec<&'static str> {
            self.1.clone()
        }
        fn evaluate(&self, model: &RasModel) -> Result<Evaluation, CheckError> {
            Ok(CheckResult::ok(self.0, model.project.filename()).into())
        }
    }

    fn empty_registry() -> Registry {
        Registry::new(Arc::new(ConventionSchema::bundled().unwrap()))
    }

    #[test]
    fn test_register_preserves_order_per_suite() {
        let mut reg = empty_registry();
        reg.register(&["ffrd", "ble"], Arc::new(Named("A", vec![])), &[]).unwrap();
        reg.register(&["ble"], Arc::new(Named("B", vec![])), &["A"]).unwrap();
        reg.register(&["ffrd"], Arc::new(Named("C", vec![])), &[]).unwrap();
        let ble: Vec<&str> = reg.get("ble").unwrap().entries().iter().map(|e| e.checker.id()).collect();
        let ffrd: Vec<&str> = reg.get("ffrd").unwrap().entries().iter().map(|e| e.checker.id()).collect();
        assert_eq!(ble, vec!["A", "B"]);
        assert_eq!(ffrd, vec!["A", "C"]);
    }

    #[test]
    fn test_unknown_suite_is_fatal_and_leaves_no_partial_state() {
        let mut reg = empty_registry();
        let err = reg
            .register(&["ffrd", "stac"], Arc::new(Named("A", vec![])), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSuite { ref name, .. } if name == "stac"));
        assert!(reg.get("ffrd").unwrap().is_empty());
    }

    #[test]
    fn test_get_unknown_suite() {
        let reg = empty_registry();
        assert!(matches!(reg.get("FFRD"), Err(ConfigError::UnknownSuite { .. })));
    }

    #[test]
    fn test_dependency_must_be_registered_first() {
        let mut reg = empty_registry();
        let err = reg
            .register(&["ble"], Arc::new(Named("B", vec![])), &["A"])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDependency { .. }));
    }

    #[test]
    fn test_duplicate_checker_rejected() {
        let mut suite = CheckSuite::new(SuiteName::Ble);
        suite.add(Arc::new(Named("A", vec![])), &[]).unwrap();
        assert!(matches!(
            suite.add(Arc::new(Named("A", vec![])), &[]),
            Err(ConfigError::DuplicateChecker { .. })
        ));
    }

    #[test]
    fn test_duplicate_in_later_suite_leaves_earlier_suites_untouched() {
        let mut reg = empty_registry();
        reg.register(&["ble"], Arc::new(Named("A", vec![])), &[]).unwrap();
        let err = reg
            .register(&["ffrd", "ble"], Arc::new(Named("A", vec![])), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateChecker { ref suite, .. } if suite == "ble"));
        assert!(reg.get("ffrd").unwrap().is_empty());
        assert_eq!(reg.get("ble").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_schema_property_is_fatal() {
        let mut reg = empty_registry();
        let err = reg
            .register(&["ffrd"], Arc::new(Named("A", vec!["no_such_property"])), &[])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSchemaProperty { .. }));
    }

    #[test]
    fn test_builtin_table_registers_cleanly() {
        let reg = Registry::with_builtins(Arc::new(ConventionSchema::bundled().unwrap())).unwrap();
        assert!(!reg.get("ffrd").unwrap().is_empty());
        assert!(reg.get("ble").unwrap().contains("FileStructure"));
    }
}
