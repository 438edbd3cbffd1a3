//! Policy head matching.
//!
//! Scope tests only compare uids and type names, so they never fail. Anything
//! that cannot be decided, such as an unknown request slot, is a non-match.

use crate::ast::{Scope, ScopeConstraint};
use crate::traits::EntitySource;
use crate::types::{EntityUid, PolicyMatchReason, Request};

/// Test one head constraint against a request slot.
pub fn constraint_matches<S>(
    constraint: &ScopeConstraint,
    slot: Option<&EntityUid>,
    entities: &S,
) -> bool
where
    S: EntitySource + ?Sized,
{
    let Some(uid) = slot else {
        return matches!(constraint, ScopeConstraint::Any);
    };

    match constraint {
        ScopeConstraint::Any => true,
        ScopeConstraint::Eq { entity } => uid == entity,
        ScopeConstraint::In { entity } => entities.is_descendant_of(uid, entity),
        ScopeConstraint::InSet { entities: targets } => targets
            .iter()
            .any(|target| entities.is_descendant_of(uid, target)),
        ScopeConstraint::Is { entity_type } => uid.entity_type() == entity_type,
        ScopeConstraint::IsIn {
            entity_type,
            entity,
        } => uid.entity_type() == entity_type && entities.is_descendant_of(uid, entity),
    }
}

/// True iff all three head constraints match the request.
pub fn scope_matches<S>(scope: &Scope, request: &Request, entities: &S) -> bool
where
    S: EntitySource + ?Sized,
{
    constraint_matches(&scope.principal, request.principal.as_ref(), entities)
        && constraint_matches(&scope.action, request.action.as_ref(), entities)
        && constraint_matches(&scope.resource, request.resource.as_ref(), entities)
}

pub(crate) fn principal_match_reason<S>(
    constraint: &ScopeConstraint,
    principal: &EntityUid,
    entities: &S,
) -> Option<PolicyMatchReason>
where
    S: EntitySource + ?Sized,
{
    if !constraint_matches(constraint, Some(principal), entities) {
        return None;
    }
    let reason = match constraint {
        ScopeConstraint::Any => PolicyMatchReason::PrincipalAny,
        ScopeConstraint::Eq { .. } => PolicyMatchReason::PrincipalEq,
        ScopeConstraint::In { .. } | ScopeConstraint::InSet { .. } => PolicyMatchReason::PrincipalIn,
        ScopeConstraint::Is { .. } => PolicyMatchReason::PrincipalIs,
        ScopeConstraint::IsIn { .. } => PolicyMatchReason::PrincipalIsIn,
    };
    Some(reason)
}
