//! List command implementation.
//!
//! Prints the built-in requirement and exemption registries.

use console::style;

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::exemptions::{Clause, ExemptionRegistry};
use crate::requirements::{RequirementRegistry, Strategy};

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(args: ListArgs) -> Self {
        Self { args }
    }
}

fn strategy_label(strategy: &Strategy) -> String {
    match strategy {
        Strategy::Predicate(predicate) => format!("spatial: {}", predicate.dataset),
        Strategy::Model { model_id } => format!("model: {}", model_id),
        Strategy::Unimplemented => "unimplemented".to_string(),
    }
}

fn clause_label(clause: &Clause) -> String {
    match clause {
        Clause::Requires(id) => id.clone(),
        Clause::AnyOf(ids) => format!("any of {}", ids.join(", ")),
    }
}

fn registries_as_json(
    requirements: &RequirementRegistry,
    exemptions: &ExemptionRegistry,
) -> serde_json::Value {
    let requirements: Vec<_> = requirements
        .ids()
        .into_iter()
        .filter_map(|id| requirements.get(id))
        .map(|def| {
            serde_json::json!({
                "id": def.id,
                "field_name": def.field_name,
                "strategy": strategy_label(&def.strategy),
            })
        })
        .collect();
    let exemptions: Vec<_> = exemptions
        .definitions()
        .map(|def| {
            serde_json::json!({
                "id": def.id,
                "field_name": def.field_name,
                "clauses": def.clauses.iter().map(clause_label).collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::json!({
        "requirements": requirements,
        "exemptions": exemptions,
    })
}

impl Command for ListCommand {
    fn execute(&self) -> Result<CommandResult> {
        let requirements = RequirementRegistry::statewide();
        let exemptions = ExemptionRegistry::statewide();

        if self.args.json {
            let value = registries_as_json(&requirements, &exemptions);
            println!(
                "{}",
                serde_json::to_string_pretty(&value)
                    .map_err(|e| crate::error::SitecheckError::Other(e.into()))?
            );
            return Ok(CommandResult::success());
        }

        if !self.args.exemptions_only {
            println!("  {}", style("Requirements:").bold());
            for id in requirements.ids() {
                if let Some(def) = requirements.get(id) {
                    println!(
                        "    {} {} {}",
                        style(id).cyan(),
                        def.field_name,
                        style(strategy_label(&def.strategy)).dim()
                    );
                }
            }
            if !self.args.requirements_only {
                println!();
            }
        }

        if !self.args.requirements_only {
            println!("  {}", style("Exemptions:").bold());
            for def in exemptions.definitions() {
                let clauses: Vec<String> = def.clauses.iter().map(clause_label).collect();
                println!(
                    "    {} {}",
                    style(&def.id).cyan(),
                    style(clauses.join("; ")).dim()
                );
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::SpatialPredicate;

    #[test]
    fn labels_cover_all_strategies() {
        let predicate = Strategy::Predicate(SpatialPredicate::center_within("city_boundaries"));
        assert_eq!(strategy_label(&predicate), "spatial: city_boundaries");
        let model = Strategy::Model {
            model_id: "r26".to_string(),
        };
        assert_eq!(strategy_label(&model), "model: r26");
        assert_eq!(strategy_label(&Strategy::Unimplemented), "unimplemented");
    }

    #[test]
    fn json_listing_covers_both_registries() {
        let requirements = RequirementRegistry::statewide();
        let exemptions = ExemptionRegistry::statewide();
        let value = registries_as_json(&requirements, &exemptions);
        assert_eq!(
            value["requirements"].as_array().unwrap().len(),
            requirements.ids().len()
        );
        assert!(value["exemptions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["id"] == "21159.24"));
    }

    #[test]
    fn clause_labels() {
        assert_eq!(clause_label(&Clause::Requires("2.5".to_string())), "2.5");
        assert_eq!(
            clause_label(&Clause::AnyOf(vec!["3.2".to_string(), "3.13".to_string()])),
            "any of 3.2, 3.13"
        );
    }
}
