//! Three-valued requirement and exemption values.
//!
//! Every requirement and exemption attribute holds one of three values:
//! met (1), not met (0), or unknown (insufficient data). Unknown is a
//! permanent, meaningful result for the current pass — it never means
//! "not yet evaluated".
//!
//! Columns store values as nullable small integers (`Option<i16>`): 1, 0,
//! or null for unknown. [`TriState`] is the in-memory form with the logic
//! combinators on it.

use serde::{Deserialize, Serialize};

/// A three-valued eligibility result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    /// The criterion is not met (stored as 0).
    No,
    /// The criterion is met (stored as 1).
    Yes,
    /// Insufficient data to decide (stored as null).
    Unknown,
}

impl TriState {
    /// Convert from a stored nullable small integer. Any non-zero value is
    /// treated as met, matching how the collaborators write 1s.
    pub fn from_stored(value: Option<i16>) -> Self {
        match value {
            Some(0) => TriState::No,
            Some(_) => TriState::Yes,
            None => TriState::Unknown,
        }
    }

    /// Convert to the stored nullable small integer form.
    pub fn to_stored(self) -> Option<i16> {
        match self {
            TriState::No => Some(0),
            TriState::Yes => Some(1),
            TriState::Unknown => None,
        }
    }

    /// Whether this value is exactly `Yes`.
    pub fn is_yes(self) -> bool {
        matches!(self, TriState::Yes)
    }

    /// Three-valued AND over a sequence of values.
    ///
    /// Any `No` dominates and produces `No`, even when other values are
    /// unknown. Only an all-`Yes` sequence produces `Yes`; anything else
    /// (no `No`, at least one unknown) is `Unknown`. The empty sequence is
    /// vacuously `Yes`.
    pub fn all(values: impl IntoIterator<Item = TriState>) -> TriState {
        let mut saw_unknown = false;
        for value in values {
            match value {
                TriState::No => return TriState::No,
                TriState::Unknown => saw_unknown = true,
                TriState::Yes => {}
            }
        }
        if saw_unknown {
            TriState::Unknown
        } else {
            TriState::Yes
        }
    }

    /// Three-valued OR over a sequence of values.
    ///
    /// Any `Yes` dominates and produces `Yes`. With no `Yes` present, a
    /// single unknown makes the result `Unknown`; otherwise all values are
    /// `No` and so is the result. The empty sequence is `No`.
    pub fn any(values: impl IntoIterator<Item = TriState>) -> TriState {
        let mut saw_unknown = false;
        for value in values {
            match value {
                TriState::Yes => return TriState::Yes,
                TriState::Unknown => saw_unknown = true,
                TriState::No => {}
            }
        }
        if saw_unknown {
            TriState::Unknown
        } else {
            TriState::No
        }
    }
}
