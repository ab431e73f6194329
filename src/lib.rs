//! Sitecheck - statewide parcel requirement and exemption calculation.
//!
//! Sitecheck evaluates location-based regulatory requirements for every
//! parcel in per-entity snapshots, derives exemption eligibility from the
//! requirement results under three-valued logic, and materializes both
//! into two shared statewide tables that stay consistent across reruns.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`collaborators`] - Geometry and model engine seams
//! - [`config`] - Run configuration loading and validation
//! - [`context`] - Per-run state assembled at startup
//! - [`error`] - Error types and result alias
//! - [`exemptions`] - Exemption registry and the tri-state sweep
//! - [`materializer`] - Idempotent shared-table output
//! - [`parcels`] - Parcel snapshots and the wide per-entity table
//! - [`requirements`] - Requirement registry, availability mask, evaluator
//! - [`runner`] - Per-entity pipeline orchestration
//! - [`tristate`] - Three-valued logic primitives
//!
//! # Example
//!
//! ```
//! use sitecheck::tristate::TriState;
//!
//! // An exemption holds only when every requirement it names holds.
//! let values = [TriState::Yes, TriState::Unknown, TriState::No];
//! assert_eq!(TriState::all(values), TriState::No);
//! ```

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod exemptions;
pub mod materializer;
pub mod parcels;
pub mod requirements;
pub mod runner;
pub mod tristate;

pub use error::{Result, SitecheckError};
