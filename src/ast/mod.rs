//! The policy AST: expressions, patterns and policies.

mod expr;
mod pattern;
mod policy;

pub use expr::{BinaryOp, Expr, UnaryOp, Var};
pub use pattern::{Pattern, PatternElem};
pub use policy::{
    Condition, ConditionKind, Effect, Policy, PolicyId, PolicySet, Scope, ScopeConstraint,
};
