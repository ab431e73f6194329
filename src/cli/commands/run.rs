//! Run command implementation.
//!
//! Loads the run configuration, resolves the entity and requirement
//! selections, and drives the run controller with a progress bar. When all
//! entities are selected and shared tables already hold rows, the command
//! asks for confirmation before replacing them.
//!
//! This build ships no geometry or model backend: the controller is wired
//! to [`NullEngine`], so every dispatched requirement fails and each entity
//! is reported as failed. Deployments supply real engines; the rest of the
//! pipeline (selection, masking, prompts, summaries) behaves identically.

use std::path::{Path, PathBuf};

use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::RunArgs;
use crate::collaborators::NullEngine;
use crate::config::{RunConfig, SelectorSpec};
use crate::context::RunContext;
use crate::error::{Result, SitecheckError};
use crate::materializer::TableKind;
use crate::runner::{EntityStatus, RunController, RunOptions};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    config_path: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(config_path: &Path, args: RunArgs) -> Self {
        Self {
            config_path: config_path.to_path_buf(),
            args,
        }
    }

    /// The entity selector, with CLI arguments taking precedence.
    fn entity_spec(&self, config: &RunConfig) -> SelectorSpec {
        if self.args.entities.is_empty() {
            config.entities.clone()
        } else {
            SelectorSpec::List(self.args.entities.clone())
        }
    }

    /// The requirement selector, with CLI arguments taking precedence.
    fn requirement_spec(&self, config: &RunConfig) -> SelectorSpec {
        if self.args.requirements.is_empty() {
            config.requirements.clone()
        } else {
            SelectorSpec::List(self.args.requirements.clone())
        }
    }

    /// Ask before replacing rows for every entity in the shared tables.
    fn confirm_full_reprocess(&self, ctx: &RunContext, total: usize) -> Result<bool> {
        if self.args.non_interactive || self.args.resume {
            return Ok(true);
        }
        let has_output = ctx.store.exists(TableKind::Requirements)
            || ctx.store.exists(TableKind::Exemptions);
        if !has_output {
            return Ok(true);
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Reprocess all {} entities? Existing rows will be replaced",
                total
            ))
            .default(false)
            .interact()
            .map_err(|e| SitecheckError::Other(e.into()))?;
        Ok(confirmed)
    }
}

impl Command for RunCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = match RunConfig::load(&self.config_path) {
            Ok(c) => c,
            Err(SitecheckError::ConfigNotFound { path }) => {
                eprintln!(
                    "{} no run configuration at {}",
                    style("error:").red().bold(),
                    path.display()
                );
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        let ctx = RunContext::from_config(&config)?;
        let engine = NullEngine;
        let controller = RunController::new(&ctx, &engine, &engine);

        let entity_spec = self.entity_spec(&config);
        let entities = controller.resolve_entities(&entity_spec)?;
        let requirements = controller.resolve_requirements(&self.requirement_spec(&config))?;

        if entities.is_empty() {
            println!("{}", style("No parcel snapshots found.").yellow());
            return Ok(CommandResult::success());
        }

        if entity_spec.is_wildcard() && !self.confirm_full_reprocess(&ctx, entities.len())? {
            println!("{}", style("Cancelled.").yellow());
            return Ok(CommandResult::success());
        }

        let bar = ProgressBar::new(entities.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let options = RunOptions {
            resume: self.args.resume,
        };
        let summary = controller.run_with_progress(
            &entities,
            &requirements,
            options,
            &mut |_done, _total, entity| {
                bar.set_message(entity.to_string());
                bar.inc(1);
            },
        )?;
        bar.finish_and_clear();

        let skipped = summary
            .outcomes
            .iter()
            .filter(|o| o.status == EntityStatus::Skipped)
            .count();
        println!(
            "{} {} completed, {} skipped, {} failed in {}s",
            style("Done:").green().bold(),
            summary.completed(),
            skipped,
            summary.failed().len(),
            summary.duration().num_seconds()
        );
        for outcome in summary.failed() {
            if let EntityStatus::Failed(message) = &outcome.status {
                println!(
                    "  {} {}: {}",
                    style("failed").red(),
                    outcome.entity,
                    message
                );
            }
        }

        if summary.failed().is_empty() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
