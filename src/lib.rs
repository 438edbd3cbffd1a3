// src/lib.rs
pub use authorizer::Authorizer;
pub use config::{DEFAULT_MAX_DEPTH, EvaluationLimits};
pub use engine::PolicyEngine;
pub use error::{EvalError, PolicyError};
pub use evaluator::{Evaluator, evaluate};
pub use partial::{PartialEvaluator, PartialOutcome, PartialValue, partial_evaluate};
pub use policy_eval::{PolicyOutcome, is_satisfied, is_satisfied_with_limits};
pub use scope::{constraint_matches, scope_matches};
pub use traits::EntitySource;
pub use types::{
    Decision, Entities, Entity, EntityType, EntityUid, PartialResponse, PolicyEffectFilter,
    PolicyEvaluationError, PolicyMatch, PolicyMatchReason, PrincipalPolicies, Record,
    Request, ResidualPolicy, Response, Set, Type, Value,
};

pub mod ast;
mod authorizer;
mod config;
mod engine;
mod error;
mod evaluator;
pub mod extensions;
pub mod metrics;
mod partial;
mod policy_eval;
mod scope;
mod timers;
mod traits;
pub mod types;

#[cfg(test)]
mod tests;
