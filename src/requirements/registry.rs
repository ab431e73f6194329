//! Requirement registry and definitions.
//!
//! Defines the requirements that exist, the stable output column each one
//! writes, and the strategy used to evaluate it: a described spatial
//! predicate, a named external model, or not-yet-implemented. The registry
//! is built once at startup and read-only afterwards.
//!
//! Identifiers are dotted strings grouped by theme: 0.x bookkeeping, 2.x
//! location, 3.x transit proximity, 8.x environmental limitations, 9.x
//! hazards. Requirement 0.1 is a first-class entry that no exemption
//! references.

use std::collections::BTreeMap;

use crate::collaborators::SpatialPredicate;
use crate::error::{Result, SitecheckError};

/// How a requirement's values get computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Evaluate a spatial predicate through the geometry engine.
    Predicate(SpatialPredicate),

    /// Run a named external model through the model engine.
    Model { model_id: String },

    /// No evaluation logic registered yet. The column is added and left
    /// null; this is documented behavior for identifiers awaiting an
    /// implementation, not an error.
    Unimplemented,
}

/// A requirement definition.
#[derive(Debug, Clone)]
pub struct RequirementDef {
    /// Dotted identifier (e.g. "2.3", "9.5").
    pub id: String,
    /// Stable output column name.
    pub field_name: String,
    /// Evaluation strategy.
    pub strategy: Strategy,
}

impl RequirementDef {
    fn predicate(id: &str, field_name: &str, predicate: SpatialPredicate) -> Self {
        Self {
            id: id.to_string(),
            field_name: field_name.to_string(),
            strategy: Strategy::Predicate(predicate),
        }
    }

    fn model(id: &str, field_name: &str, model_id: &str) -> Self {
        Self {
            id: id.to_string(),
            field_name: field_name.to_string(),
            strategy: Strategy::Model {
                model_id: model_id.to_string(),
            },
        }
    }
}

/// Registry of all known requirements.
#[derive(Debug, Clone, Default)]
pub struct RequirementRegistry {
    requirements: BTreeMap<String, RequirementDef>,
}

impl RequirementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in statewide requirement set.
    pub fn statewide() -> Self {
        let mut registry = Self::new();

        // Bookkeeping: referenced by no exemption, computed like any other.
        registry.insert(RequirementDef::predicate(
            "0.1",
            "urbanized_area_prc_21071_unincorporated_0_1",
            SpatialPredicate::center_within("urbanized_area_prc_21071")
                .with_filter("community_type = 'Unincorporated Island' AND urbanized_area_prc_21071 = 1"),
        ));

        // Location requirements.
        registry.insert(RequirementDef::predicate(
            "2.1",
            "urbanized_area_prc_21071_2_1",
            SpatialPredicate::center_within("urbanized_area_prc_21071")
                .with_filter("urbanized_area_prc_21071 = 1"),
        ));
        registry.insert(RequirementDef::predicate(
            "2.2",
            "urban_area_prc_21094_2_2",
            SpatialPredicate::center_within("urban_area_prc_21094_5")
                .with_filter("urban_area_prc_21094_5 = 1"),
        ));
        registry.insert(RequirementDef::predicate(
            "2.3",
            "within_city_limits_2_3",
            SpatialPredicate::center_within("city_boundaries"),
        ));
        registry.insert(RequirementDef::predicate(
            "2.4",
            "unincorporated_2_4",
            // Centers inside an incorporated place score 0; everything else 1.
            SpatialPredicate {
                dataset: "incorporated_places".to_string(),
                relation: crate::collaborators::SpatialRelation::CenterWithin,
                filter: None,
                invert: true,
            },
        ));
        registry.insert(RequirementDef::predicate(
            "2.5",
            "within_mpo_2_5",
            SpatialPredicate::center_within("mpo_boundaries_dissolve"),
        ));
        registry.insert(RequirementDef::model("2.6", "covered_by_a_specific_plan_2_6", "r26"));
        registry.insert(RequirementDef::predicate(
            "2.7",
            "urbanized_area_or_urban_cluster_2_7",
            SpatialPredicate::center_within("urbanized_area_urban_cluster"),
        ));

        // Transit proximity requirements: all external models.
        registry.insert(RequirementDef::model("3.1", "within_half_mile_major_transit_stop_3_1", "r31"));
        registry.insert(RequirementDef::model("3.2", "within_quarter_mile_transit_corridor_3_2", "r32"));
        registry.insert(RequirementDef::model("3.3", "transit_priority_area_3_3", "r33"));
        registry.insert(RequirementDef::model("3.4", "within_half_mile_transit_corridor_3_4", "r34"));
        registry.insert(RequirementDef::model("3.5", "within_half_mile_stop_transit_corridor_3_5", "r35"));
        registry.insert(RequirementDef::model("3.6", "low_vmt_15_percent_below_regional_3_6", "r36"));
        registry.insert(RequirementDef::model("3.8", "low_vehicle_travel_area_3_8", "r38"));
        registry.insert(RequirementDef::model("3.9", "planned_rtp_half_mile_major_transit_stop_3_9", "r39"));
        registry.insert(RequirementDef::model("3.10", "planned_rtip_half_mile_major_transit_stop_3_10", "r310"));
        registry.insert(RequirementDef::model("3.11", "planned_rtip_half_mile_stop_hqtc_3_11", "r311"));
        registry.insert(RequirementDef::model("3.12", "planned_rtp_half_mile_hqtc_3_12", "r312"));
        registry.insert(RequirementDef::model("3.13", "planned_rtp_quarter_mile_hqtc_3_13", "r313"));
        registry.insert(RequirementDef::model(
            "3.14",
            "within_half_mile_rail_transit_station_or_ferry_terminal_3_14",
            "r314",
        ));

        // Environmental limitations.
        registry.insert(RequirementDef::model("8.1", "wetlands_8_1", "r81"));
        registry.insert(RequirementDef::model("8.2", "riparian_areas_8_2", "r82"));
        registry.insert(RequirementDef::model("8.3", "special_habitats_8_3", "r83"));
        registry.insert(RequirementDef::predicate(
            "8.5",
            "rare_threatened_endangered_sp_8_5",
            SpatialPredicate::intersects_disqualifies("rare_threatened_or_endangered"),
        ));
        registry.insert(RequirementDef::predicate(
            "8.6",
            "prime_farmlands_or_farmlands_of_statewide_importance_8_6",
            SpatialPredicate::intersects_disqualifies("prime_farmlands")
                .with_filter("polygon_ty IN ('P', 'S')"),
        ));

        // Hazards.
        registry.insert(RequirementDef::model("9.2", "earthquake_hazard_zone_9_2", "r92"));
        registry.insert(RequirementDef::predicate(
            "9.3",
            "wildfire_hazard_9_3",
            SpatialPredicate::intersects_disqualifies("wildfire_hazard_zones")
                .with_filter("HAZ_CLASS IN ('High', 'Very High')"),
        ));
        registry.insert(RequirementDef::predicate(
            "9.4",
            "flood_plain_9_4",
            SpatialPredicate::intersects_disqualifies("fema_100_year_floodplain"),
        ));
        registry.insert(RequirementDef::predicate(
            "9.5",
            "landslide_hazard_9_5",
            SpatialPredicate {
                dataset: "landslide_hazard_raster".to_string(),
                relation: crate::collaborators::SpatialRelation::RasterFractionAtLeast {
                    threshold_percent: 20.0,
                },
                filter: None,
                invert: true,
            },
        ));
        registry.insert(RequirementDef::predicate(
            "9.6",
            "state_conservancy_9_6",
            SpatialPredicate::intersects_disqualifies("state_conservancy"),
        ));
        registry.insert(RequirementDef::predicate(
            "9.7",
            "local_coastal_zone_9_7",
            SpatialPredicate::intersects_disqualifies("coastal_zone_boundary"),
        ));
        registry.insert(RequirementDef::predicate(
            "9.8",
            "protected_area_mask_9_8",
            SpatialPredicate::intersects_disqualifies("protected_area_mask"),
        ));

        registry
    }

    /// Insert a requirement definition.
    ///
    /// Registries are assembled at startup; later additions (e.g. a new
    /// identifier landing ahead of its evaluation logic) go through here
    /// before the run begins.
    pub fn insert(&mut self, def: RequirementDef) {
        self.requirements.insert(def.id.clone(), def);
    }

    /// Look up a requirement by identifier.
    pub fn get(&self, id: &str) -> Option<&RequirementDef> {
        self.requirements.get(id)
    }

    /// Resolve the output column name for an identifier.
    pub fn resolve_field(&self, id: &str) -> Result<&str> {
        self.get(id)
            .map(|def| def.field_name.as_str())
            .ok_or_else(|| SitecheckError::UnknownRequirement { id: id.to_string() })
    }

    /// All known identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.requirements.keys().map(|s| s.as_str()).collect()
    }

    /// All output column names.
    pub fn field_names(&self) -> Vec<&str> {
        self.requirements
            .values()
            .map(|d| d.field_name.as_str())
            .collect()
    }

    /// Validate the registry: output column names must be globally unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for def in self.requirements.values() {
            if !seen.insert(&def.field_name) {
                return Err(SitecheckError::ConfigValidationError {
                    message: format!(
                        "duplicate requirement column name '{}'",
                        def.field_name
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statewide_has_expected_entries() {
        let registry = RequirementRegistry::statewide();
        let ids = registry.ids();
        for id in ["0.1", "2.1", "2.7", "3.1", "3.14", "8.1", "8.6", "9.2", "9.8"] {
            assert!(ids.contains(&id), "missing {}", id);
        }
        // Retired identifiers are absent.
        assert!(!ids.contains(&"3.7"));
        assert!(!ids.contains(&"8.4"));
        assert!(!ids.contains(&"9.1"));
    }

    #[test]
    fn resolve_field_known() {
        let registry = RequirementRegistry::statewide();
        assert_eq!(registry.resolve_field("2.3").unwrap(), "within_city_limits_2_3");
    }

    #[test]
    fn resolve_field_unknown_errors() {
        let registry = RequirementRegistry::statewide();
        let err = registry.resolve_field("42.1").unwrap_err();
        assert!(matches!(err, SitecheckError::UnknownRequirement { .. }));
    }

    #[test]
    fn model_requirements_carry_model_ids() {
        let registry = RequirementRegistry::statewide();
        let def = registry.get("3.10").unwrap();
        assert!(matches!(
            &def.strategy,
            Strategy::Model { model_id } if model_id == "r310"
        ));
    }

    #[test]
    fn hazard_predicates_are_inverted() {
        let registry = RequirementRegistry::statewide();
        for id in ["8.5", "9.3", "9.4", "9.6", "9.7", "9.8"] {
            let def = registry.get(id).unwrap();
            match &def.strategy {
                Strategy::Predicate(p) => assert!(p.invert, "{} should invert", id),
                other => panic!("{} should be a predicate, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn statewide_validates() {
        RequirementRegistry::statewide().validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_columns() {
        let mut registry = RequirementRegistry::new();
        registry.insert(RequirementDef {
            id: "1.1".into(),
            field_name: "dupe_1_1".into(),
            strategy: Strategy::Unimplemented,
        });
        registry.insert(RequirementDef {
            id: "1.2".into(),
            field_name: "dupe_1_1".into(),
            strategy: Strategy::Unimplemented,
        });
        assert!(registry.validate().is_err());
    }

    #[test]
    fn ids_are_sorted() {
        let registry = RequirementRegistry::statewide();
        let ids = registry.ids();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
