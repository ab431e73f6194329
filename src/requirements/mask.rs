//! Data availability mask.
//!
//! Operator-maintained list of requirements for which an entity has no
//! underlying source data. Masked requirements are always materialized as
//! null, regardless of what a collaborator would compute, and the
//! collaborator is never invoked for them.
//!
//! A distinguished all-entities set applies universally and is unioned with
//! each entity's own set at query time.

use std::collections::{BTreeMap, BTreeSet};

/// Per-entity no-data overrides, plus a universal set.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityMask {
    all_entities: BTreeSet<String>,
    by_entity: BTreeMap<String, BTreeSet<String>>,
}

impl AvailabilityMask {
    /// Empty mask: nothing is withheld.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit parts.
    pub fn from_parts(
        all_entities: impl IntoIterator<Item = String>,
        by_entity: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        Self {
            all_entities: all_entities.into_iter().collect(),
            by_entity: by_entity
                .into_iter()
                .map(|(e, reqs)| (e, reqs.into_iter().collect()))
                .collect(),
        }
    }

    /// The built-in statewide no-data table.
    ///
    /// Reflects which regional agencies have supplied transit (3.9–3.14),
    /// specific-plan (2.6) and landslide (9.5) data. Counties absent from
    /// this table have full coverage.
    pub fn statewide() -> Self {
        let transit = ["3.9", "3.10", "3.11", "3.12", "3.13", "3.14"];
        let rural: Vec<&str> = ["2.6"].iter().chain(&transit).chain(&["9.5"]).copied().collect();
        let no_plan_no_slide: Vec<&str> = transit.iter().chain(&["9.5"]).copied().collect();
        let mtc_core = ["3.10", "3.11", "3.12", "3.13", "3.14"];

        let mut by_entity: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        // AMBAG
        by_entity.insert("monterey", rural.clone());
        by_entity.insert("sanbenito", rural.clone());
        by_entity.insert("santacruz", no_plan_no_slide.clone());
        // BCAG
        by_entity.insert("butte", vec!["3.10", "3.14", "9.5"]);
        // FCOG / KCOG / MCAG / SLOCOG / SRTA / StanCOG / SANDAG / SBCAG
        for county in [
            "fresno",
            "kern",
            "merced",
            "sandiego",
            "santabarbara",
            "sanluisobispo",
            "shasta",
            "stanislaus",
        ] {
            by_entity.insert(county, no_plan_no_slide.clone());
        }
        // KCAG / MCTC / SJCOG / TCAG
        for county in ["kings", "madera", "sanjoaquin", "tulare"] {
            by_entity.insert(county, rural.clone());
        }
        // MTC
        for county in ["alameda", "contracosta", "sanmateo", "santaclara"] {
            by_entity.insert(county, mtc_core.to_vec());
        }
        for county in ["marin", "napa", "solano", "sonoma"] {
            let mut reqs = mtc_core.to_vec();
            reqs.push("9.5");
            by_entity.insert(county, reqs);
        }
        by_entity.insert(
            "sanfrancisco",
            ["2.6"].iter().chain(&mtc_core).copied().collect(),
        );
        // SACOG
        for county in ["eldorado", "placer", "sacramento", "sutter", "yolo", "yuba"] {
            by_entity.insert(county, vec!["9.5"]);
        }
        // SCAG
        by_entity.insert("imperial", vec!["3.10", "3.14", "9.5"]);
        for county in ["losangeles", "orange", "riverside", "sanbernardino", "ventura"] {
            by_entity.insert(county, vec!["3.10", "3.14"]);
        }
        // Remaining rural counties
        for county in [
            "alpine", "amador", "calaveras", "colusa", "delnorte", "glenn", "humboldt",
            "inyo", "lake", "lassen", "mariposa", "modoc", "nevada", "plumas", "sierra",
            "siskiyou", "tehama", "trinity", "tuolumne",
        ] {
            by_entity.insert(county, rural.clone());
        }
        for county in ["mendocino", "mono"] {
            by_entity.insert(county, no_plan_no_slide.clone());
        }

        Self::from_parts(
            [],
            by_entity.into_iter().map(|(e, reqs)| {
                (
                    e.to_string(),
                    reqs.into_iter().map(String::from).collect::<Vec<_>>(),
                )
            }),
        )
    }

    /// Whether a requirement is masked for an entity.
    pub fn is_masked(&self, entity: &str, requirement_id: &str) -> bool {
        self.all_entities.contains(requirement_id)
            || self
                .by_entity
                .get(entity)
                .is_some_and(|reqs| reqs.contains(requirement_id))
    }

    /// The full masked set for an entity (entity-specific ∪ all-entities).
    pub fn masked_for(&self, entity: &str) -> BTreeSet<String> {
        let mut masked = self.all_entities.clone();
        if let Some(reqs) = self.by_entity.get(entity) {
            masked.extend(reqs.iter().cloned());
        }
        masked
    }

    /// Add a requirement to the all-entities set.
    pub fn mask_everywhere(&mut self, requirement_id: &str) {
        self.all_entities.insert(requirement_id.to_string());
    }

    /// Add a requirement to one entity's set.
    pub fn mask_for(&mut self, entity: &str, requirement_id: &str) {
        self.by_entity
            .entry(entity.to_string())
            .or_default()
            .insert(requirement_id.to_string());
    }
}
