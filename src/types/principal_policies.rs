//! Policies that apply to a given principal.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::ast::{Effect, Policy, PolicyId, ScopeConstraint};

use super::EntityUid;

/// Why a policy's principal constraint admits the principal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyMatchReason {
    PrincipalEq,
    PrincipalIn,
    PrincipalAny,
    PrincipalIs,
    PrincipalIsIn,
}

/// Restrict a listing to one effect.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PolicyEffectFilter {
    #[default]
    Any,
    Permit,
    Forbid,
}

impl PolicyEffectFilter {
    pub fn matches(&self, effect: Effect) -> bool {
        match self {
            PolicyEffectFilter::Any => true,
            PolicyEffectFilter::Permit => effect == Effect::Permit,
            PolicyEffectFilter::Forbid => effect == Effect::Forbid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMatch {
    pub policy: Policy,
    pub reason: PolicyMatchReason,
}

/// The policies whose principal constraint admits one principal, in
/// policy-set order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalPolicies {
    principal: EntityUid,
    matches: Vec<PolicyMatch>,
}

impl PrincipalPolicies {
    pub fn new(principal: EntityUid, matches: Vec<PolicyMatch>) -> Self {
        PrincipalPolicies { principal, matches }
    }

    pub fn principal(&self) -> &EntityUid {
        &self.principal
    }

    pub fn matches(&self) -> &[PolicyMatch] {
        &self.matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn policy_ids(&self) -> Vec<&PolicyId> {
        self.matches.iter().map(|m| m.policy.id()).collect()
    }

    /// Actions named by the matched policies' action constraints, sorted and
    /// deduplicated. Unconstrained actions contribute nothing.
    pub fn actions(&self) -> Vec<&EntityUid> {
        self.matches
            .iter()
            .flat_map(|m| match &m.policy.scope().action {
                ScopeConstraint::Eq { entity } | ScopeConstraint::In { entity } => vec![entity],
                ScopeConstraint::InSet { entities } => entities.iter().collect(),
                _ => Vec::new(),
            })
            .sorted()
            .dedup()
            .collect()
    }

    /// Get the actions as a sorted list of strings.
    pub fn actions_by_name(&self) -> Vec<String> {
        self.actions().iter().map(|a| a.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> EntityUid {
        EntityUid::new("Action", id)
    }

    #[test]
    fn test_effect_filter() {
        assert!(PolicyEffectFilter::Any.matches(Effect::Forbid));
        assert!(PolicyEffectFilter::Permit.matches(Effect::Permit));
        assert!(!PolicyEffectFilter::Permit.matches(Effect::Forbid));
        assert_eq!(
            "forbid".parse::<PolicyEffectFilter>().unwrap(),
            PolicyEffectFilter::Forbid
        );
    }

    #[test]
    fn test_actions_sorted_and_deduplicated() {
        let matches = vec![
            PolicyMatch {
                policy: Policy::permit("p0")
                    .action(ScopeConstraint::in_set([action("view"), action("edit")])),
                reason: PolicyMatchReason::PrincipalEq,
            },
            PolicyMatch {
                policy: Policy::permit("p1").action(ScopeConstraint::eq(action("view"))),
                reason: PolicyMatchReason::PrincipalAny,
            },
            PolicyMatch {
                policy: Policy::forbid("p2"),
                reason: PolicyMatchReason::PrincipalAny,
            },
        ];
        let listing = PrincipalPolicies::new(EntityUid::new("User", "alice"), matches);

        assert_eq!(listing.len(), 3);
        assert_eq!(
            listing.actions_by_name(),
            vec![r#"Action::"edit""#, r#"Action::"view""#]
        );
        assert_eq!(
            listing.policy_ids(),
            vec![&PolicyId::new("p0"), &PolicyId::new("p1"), &PolicyId::new("p2")]
        );
    }

    #[test]
    fn test_reason_names() {
        assert_eq!(PolicyMatchReason::PrincipalIsIn.to_string(), "principal_is_in");
        assert_eq!(
            serde_json::to_value(PolicyMatchReason::PrincipalAny).unwrap(),
            serde_json::json!("principal_any")
        );
    }
}
