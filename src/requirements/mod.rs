//! Requirement registry, availability mask, and evaluation pass.

pub mod evaluator;
pub mod mask;
pub mod registry;

pub use evaluator::RequirementEvaluator;
pub use mask::AvailabilityMask;
pub use registry::{RequirementDef, RequirementRegistry, Strategy};
