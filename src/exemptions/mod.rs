//! Exemption registry and the tri-state evaluation sweep.

pub mod evaluator;
pub mod registry;

pub use evaluator::ExemptionEvaluator;
pub use registry::{Clause, ExemptionDef, ExemptionRegistry, COUNT_FIELD};
