//! Integration tests for CLI argument parsing.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_run_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let config = format!(
        "source_dir: {}\noutput_dir: {}\n",
        temp.path().join("source").display(),
        temp.path().join("output").display()
    );
    fs::create_dir_all(temp.path().join("source")).unwrap();
    fs::write(temp.path().join("sitecheck.yml"), config).unwrap();
    temp
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.arg("--help");
    // With `about` set, clap prints the package description from Cargo.toml.
    cmd.assert().success().stdout(predicate::str::contains(
        "Statewide parcel eligibility engine",
    ));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn list_prints_registries_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.arg("list");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Requirements:"))
        .stdout(predicate::str::contains("within_city_limits_2_3"))
        .stdout(predicate::str::contains("Exemptions:"))
        .stdout(predicate::str::contains("21159.24"));
    Ok(())
}

#[test]
fn list_requirements_only_omits_exemptions() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.args(["list", "--requirements-only"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Requirements:"))
        .stdout(predicate::str::contains("Exemptions:").not());
    Ok(())
}

#[test]
fn list_json_is_machine_readable() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.args(["list", "--json"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"requirements\""))
        .stdout(predicate::str::contains("\"landslide_hazard_9_5\""));
    Ok(())
}

#[test]
fn run_without_config_fails_with_guidance() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new().unwrap();
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "--non-interactive"]);
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no run configuration"));
    Ok(())
}

#[test]
fn run_with_empty_source_reports_no_snapshots() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_run_dir();
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "--non-interactive"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No parcel snapshots found."));
    Ok(())
}

#[test]
fn run_rejects_unknown_entity() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_run_dir();
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "--non-interactive", "--entities", "atlantis"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("atlantis"));
    Ok(())
}

#[test]
fn run_rejects_unknown_requirement() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_run_dir();
    fs::write(
        temp.path().join("source").join("KERN_Parcels.yml"),
        "- cbi_parcel_id_fips_apn_oid: 'k1'\n",
    )
    .unwrap();
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "--non-interactive", "--requirements", "42.1"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("42.1"));
    Ok(())
}

#[test]
fn run_without_collaborators_reports_failed_entities() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_run_dir();
    fs::write(
        temp.path().join("source").join("KERN_Parcels.yml"),
        "- cbi_parcel_id_fips_apn_oid: 'k1'\n  county_name: Kern\n",
    )
    .unwrap();
    let mut cmd = Command::new(cargo_bin("sitecheck"));
    cmd.current_dir(temp.path());
    cmd.args(["run", "--non-interactive"]);
    // The default build carries no geometry or model backends, so every
    // entity fails at its first requirement and the run exits non-zero.
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("failed"));
    Ok(())
}
