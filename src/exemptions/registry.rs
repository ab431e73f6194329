//! Exemption registry and clause definitions.
//!
//! An exemption is an AND of clauses; each clause is either a single
//! requirement identifier or an OR-group of identifiers. The grouping is an
//! explicit tagged type, not a nested-list convention, and every referenced
//! identifier is validated against the requirement registry when the
//! registry is assembled.

use std::collections::BTreeMap;

use crate::error::{Result, SitecheckError};
use crate::requirements::RequirementRegistry;

/// One AND-term of an exemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// The single requirement must hold.
    Requires(String),
    /// At least one member requirement must hold.
    AnyOf(Vec<String>),
}

impl Clause {
    /// Requirement identifiers referenced by this clause.
    pub fn requirement_ids(&self) -> impl Iterator<Item = &str> {
        match self {
            Clause::Requires(id) => std::slice::from_ref(id).iter(),
            Clause::AnyOf(ids) => ids.iter(),
        }
        .map(|s| s.as_str())
    }
}

/// An exemption definition.
#[derive(Debug, Clone)]
pub struct ExemptionDef {
    /// Statute-section identifier (e.g. "21159.24").
    pub id: String,
    /// Output column name (`E_` prefix, dots replaced).
    pub field_name: String,
    /// Ordered AND-clauses.
    pub clauses: Vec<Clause>,
}

impl ExemptionDef {
    /// Build a definition; the column name derives from the identifier.
    pub fn new(id: &str, clauses: Vec<Clause>) -> Self {
        Self {
            id: id.to_string(),
            field_name: format!("E_{}", id.replace('.', "_")),
            clauses,
        }
    }
}

/// Registry of all known exemptions.
#[derive(Debug, Clone, Default)]
pub struct ExemptionRegistry {
    exemptions: BTreeMap<String, ExemptionDef>,
}

/// Column carrying the number of satisfied exemptions per parcel.
pub const COUNT_FIELD: &str = "exemptions_count";

impl ExemptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in statewide exemption set.
    pub fn statewide() -> Self {
        fn req(id: &str) -> Clause {
            Clause::Requires(id.to_string())
        }
        fn any(ids: &[&str]) -> Clause {
            Clause::AnyOf(ids.iter().map(|s| s.to_string()).collect())
        }

        let mut registry = Self::new();
        registry.insert(ExemptionDef::new(
            "21159.24",
            ["2.1", "3.1", "8.1", "8.2", "8.3", "8.5", "9.2", "9.3", "9.4", "9.5", "9.6"]
                .iter()
                .map(|id| req(id))
                .collect(),
        ));
        registry.insert(ExemptionDef::new(
            "21155.1",
            vec![
                req("2.5"),
                any(&["3.2", "3.13", "3.14"]),
                req("8.1"),
                req("8.2"),
                req("8.3"),
                req("8.5"),
                req("9.2"),
                req("9.3"),
                req("9.4"),
                req("9.5"),
            ],
        ));
        registry.insert(ExemptionDef::new(
            "21155.2",
            vec![req("2.5"), any(&["3.1", "3.4", "3.9", "3.12"])],
        ));
        registry.insert(ExemptionDef::new(
            "21155.4",
            vec![req("2.5"), req("2.6"), req("3.3")],
        ));
        registry.insert(ExemptionDef::new(
            "21094.5",
            vec![req("2.2"), any(&["3.1", "3.5", "3.8", "3.10", "3.11"])],
        ));
        registry.insert(ExemptionDef::new("65457", vec![req("2.6")]));
        registry.insert(ExemptionDef::new("15332", vec![req("2.3"), req("8.5")]));
        registry.insert(ExemptionDef::new(
            "21159.25",
            vec![req("2.4"), req("2.7"), req("8.5")],
        ));
        registry.insert(ExemptionDef::new("21099", vec![req("3.3")]));
        registry.insert(ExemptionDef::new("21159.28", vec![req("2.5")]));
        registry.insert(ExemptionDef::new("15064.3", vec![any(&["3.1", "3.5", "3.6"])]));
        registry
    }

    /// Insert an exemption definition.
    pub fn insert(&mut self, def: ExemptionDef) {
        self.exemptions.insert(def.id.clone(), def);
    }

    /// Look up an exemption by identifier.
    pub fn get(&self, id: &str) -> Option<&ExemptionDef> {
        self.exemptions.get(id)
    }

    /// All known identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.exemptions.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate over all definitions in identifier order.
    pub fn definitions(&self) -> impl Iterator<Item = &ExemptionDef> {
        self.exemptions.values()
    }

    /// All output column names, in identifier order.
    pub fn field_names(&self) -> Vec<&str> {
        self.exemptions.values().map(|d| d.field_name.as_str()).collect()
    }

    /// Validate that every referenced requirement exists.
    ///
    /// Runs at startup; failing fast here is what lets the evaluator treat
    /// a missing column later as a pipeline ordering bug rather than a
    /// definition bug.
    pub fn validate(&self, requirements: &RequirementRegistry) -> Result<()> {
        for def in self.exemptions.values() {
            for clause in &def.clauses {
                for id in clause.requirement_ids() {
                    if requirements.get(id).is_none() {
                        return Err(SitecheckError::ConfigValidationError {
                            message: format!(
                                "exemption '{}' references unknown requirement '{}'",
                                def.id, id
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_derives_from_id() {
        let def = ExemptionDef::new("21159.24", vec![]);
        assert_eq!(def.field_name, "E_21159_24");
    }

    #[test]
    fn statewide_validates_against_statewide_requirements() {
        let requirements = RequirementRegistry::statewide();
        ExemptionRegistry::statewide().validate(&requirements).unwrap();
    }

    #[test]
    fn statewide_has_expected_exemptions() {
        let registry = ExemptionRegistry::statewide();
        let ids = registry.ids();
        for id in ["21159.24", "21155.1", "21094.5", "65457", "15332", "21099", "15064.3"] {
            assert!(ids.contains(&id), "missing {}", id);
        }
    }

    #[test]
    fn or_groups_are_tagged_clauses() {
        let registry = ExemptionRegistry::statewide();
        let def = registry.get("21155.1").unwrap();
        assert_eq!(def.clauses.len(), 10);
        assert!(matches!(
            &def.clauses[1],
            Clause::AnyOf(ids) if ids == &["3.2", "3.13", "3.14"]
        ));
    }

    #[test]
    fn no_exemption_references_requirement_0_1() {
        // 0.x requirements feed no exemption; they only live in the wide table.
        let registry = ExemptionRegistry::statewide();
        for def in registry.definitions() {
            for clause in &def.clauses {
                assert!(clause.requirement_ids().all(|id| id != "0.1"));
            }
        }
    }

    #[test]
    fn validate_rejects_unknown_reference() {
        let requirements = RequirementRegistry::statewide();
        let mut registry = ExemptionRegistry::new();
        registry.insert(ExemptionDef::new(
            "99999",
            vec![Clause::Requires("42.1".to_string())],
        ));
        let err = registry.validate(&requirements).unwrap_err();
        assert!(err.to_string().contains("42.1"));
        assert!(err.to_string().contains("99999"));
    }

    #[test]
    fn validate_checks_or_group_members() {
        let requirements = RequirementRegistry::statewide();
        let mut registry = ExemptionRegistry::new();
        registry.insert(ExemptionDef::new(
            "88888",
            vec![Clause::AnyOf(vec!["2.1".to_string(), "42.1".to_string()])],
        ));
        assert!(registry.validate(&requirements).is_err());
    }
}
