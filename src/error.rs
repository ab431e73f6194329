//! Error types for sitecheck operations.
//!
//! This module defines [`SitecheckError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `SitecheckError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `SitecheckError::Other`) for unexpected errors
//! - Fatal-for-the-run errors (a missing requirement column during the
//!   exemption sweep) and fatal-for-one-entity errors (a collaborator failure)
//!   are separate variants so the run controller can tell them apart

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sitecheck operations.
#[derive(Debug, Error)]
pub enum SitecheckError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a configuration or data file.
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A requirement identifier is not in the registry.
    #[error("Unknown requirement: {id}")]
    UnknownRequirement { id: String },

    /// An exemption identifier is not in the registry.
    #[error("Unknown exemption: {id}")]
    UnknownExemption { id: String },

    /// An entity identifier is not present in the parcel source.
    #[error("Unknown entity: {id}")]
    UnknownEntity { id: String },

    /// A requirement column was absent while evaluating an exemption.
    ///
    /// This is fatal for the whole run: it means exemptions ran before their
    /// dependent requirements were computed.
    #[error(
        "Missing requirement column '{field}' while evaluating exemption '{exemption}' \
         for entity '{entity}'. Either add the requirement to the no-data mask for this \
         entity, or re-run the requirement pass for it."
    )]
    MissingRequirementField {
        field: String,
        exemption: String,
        entity: String,
    },

    /// An external collaborator (geometry engine or model) failed.
    ///
    /// Fatal for the current entity only; the entity is left unfinished so a
    /// later run retries it.
    #[error("Collaborator failed for requirement '{requirement}' on entity '{entity}': {message}")]
    CollaboratorFailure {
        entity: String,
        requirement: String,
        message: String,
    },

    /// A parcel snapshot could not be loaded for an entity.
    #[error("Failed to load parcel snapshot for entity '{entity}': {message}")]
    SnapshotError { entity: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for sitecheck operations.
pub type Result<T> = std::result::Result<T, SitecheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_requirement_displays_id() {
        let err = SitecheckError::UnknownRequirement { id: "42.1".into() };
        assert!(err.to_string().contains("42.1"));
    }

    #[test]
    fn missing_field_names_column_and_remedies() {
        let err = SitecheckError::MissingRequirementField {
            field: "within_city_limits_2_3".into(),
            exemption: "15332".into(),
            entity: "sanbenito".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("within_city_limits_2_3"));
        assert!(msg.contains("15332"));
        assert!(msg.contains("no-data mask"));
        assert!(msg.contains("re-run the requirement pass"));
    }

    #[test]
    fn collaborator_failure_names_entity_and_requirement() {
        let err = SitecheckError::CollaboratorFailure {
            entity: "kern".into(),
            requirement: "9.5".into(),
            message: "raster unavailable".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("kern"));
        assert!(msg.contains("9.5"));
        assert!(msg.contains("raster unavailable"));
    }

    #[test]
    fn parse_error_displays_path_and_message() {
        let err = SitecheckError::ParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: SitecheckError = io_err.into();
        assert!(matches!(err, SitecheckError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(SitecheckError::UnknownEntity { id: "nowhere".into() })
        }
        assert!(returns_error().is_err());
    }
}
