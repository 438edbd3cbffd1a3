//! Single-policy evaluation.

use serde::Serialize;

use crate::ast::{ConditionKind, Policy};
use crate::config::EvaluationLimits;
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::scope::scope_matches;
use crate::traits::EntitySource;
use crate::types::Request;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PolicyOutcome {
    Satisfied,
    NotSatisfied,
    /// A condition failed to evaluate. Counts as not satisfied for the
    /// decision and is reported as a diagnostic.
    Errored(EvalError),
}

impl PolicyOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PolicyOutcome::Satisfied)
    }
}

/// Decide one policy with default limits.
pub fn is_satisfied<S>(policy: &Policy, request: &Request, entities: &S) -> PolicyOutcome
where
    S: EntitySource + ?Sized,
{
    is_satisfied_with_limits(policy, request, entities, EvaluationLimits::default())
}

/// Decide one policy.
///
/// Conditions are only looked at when the scope matches, and stop at the
/// first clause that rules the policy out.
pub fn is_satisfied_with_limits<S>(
    policy: &Policy,
    request: &Request,
    entities: &S,
    limits: EvaluationLimits,
) -> PolicyOutcome
where
    S: EntitySource + ?Sized,
{
    if !scope_matches(policy.scope(), request, entities) {
        return PolicyOutcome::NotSatisfied;
    }

    let evaluator = Evaluator::new(request, entities).with_limits(limits);
    for condition in policy.conditions() {
        let holds = match evaluator.evaluate_bool(&condition.body) {
            Ok(holds) => holds,
            Err(err) => return PolicyOutcome::Errored(err),
        };
        let required = condition.kind == ConditionKind::When;
        if holds != required {
            return PolicyOutcome::NotSatisfied;
        }
    }

    PolicyOutcome::Satisfied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ScopeConstraint};
    use crate::types::{Entities, EntityUid, Record, Type};
    use yare::parameterized;

    fn overflowing() -> Expr {
        Expr::long(i64::MAX).add(Expr::long(1))
    }

    fn request() -> Request {
        Request::new(
            EntityUid::new("User", "alice"),
            EntityUid::new("Action", "view"),
            EntityUid::new("Photo", "a.jpg"),
            Record::new(),
        )
    }

    fn outcome(policy: &Policy) -> PolicyOutcome {
        is_satisfied(policy, &request(), &Entities::empty())
    }

    #[test]
    fn test_scope_mismatch_skips_conditions() {
        let policy = Policy::permit("p")
            .principal(ScopeConstraint::eq(EntityUid::new("User", "bob")))
            .when(overflowing().eq(Expr::long(0)));
        assert_eq!(outcome(&policy), PolicyOutcome::NotSatisfied);
    }

    #[test]
    fn test_no_conditions_is_satisfied() {
        assert_eq!(outcome(&Policy::permit("p")), PolicyOutcome::Satisfied);
    }

    #[parameterized(
        when_true = { Expr::boolean(true), None, PolicyOutcome::Satisfied },
        when_false = { Expr::boolean(false), None, PolicyOutcome::NotSatisfied },
        unless_false = { Expr::boolean(true), Some(Expr::boolean(false)), PolicyOutcome::Satisfied },
        unless_true = { Expr::boolean(true), Some(Expr::boolean(true)), PolicyOutcome::NotSatisfied },
    )]
    fn test_clause_combination(when: Expr, unless: Option<Expr>, expected: PolicyOutcome) {
        let mut policy = Policy::permit("p").when(when);
        if let Some(unless) = unless {
            policy = policy.unless(unless);
        }
        assert_eq!(outcome(&policy), expected);
    }

    #[test]
    fn test_clauses_stop_at_first_deciding_clause() {
        let policy = Policy::permit("p")
            .when(Expr::boolean(false))
            .when(overflowing().eq(Expr::long(0)));
        assert_eq!(outcome(&policy), PolicyOutcome::NotSatisfied);
    }

    #[test]
    fn test_erroring_clause() {
        let policy = Policy::permit("p").when(overflowing().eq(Expr::long(0)));
        assert!(matches!(
            outcome(&policy),
            PolicyOutcome::Errored(EvalError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_non_boolean_clause_errors() {
        let policy = Policy::forbid("p").unless(Expr::long(1));
        assert_eq!(
            outcome(&policy),
            PolicyOutcome::Errored(EvalError::type_mismatch([Type::Bool], Type::Long))
        );
    }
}
