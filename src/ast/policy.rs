//! Policies, their scopes and conditions, and policy sets.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display as StrumDisplay};
use utoipa::ToSchema;

use crate::error::PolicyError;
use crate::types::{EntityType, EntityUid, Value};

use super::expr::{Expr, Var};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    pub fn new(id: impl Into<String>) -> Self {
        PolicyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PolicyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyId {
    fn from(value: &str) -> Self {
        PolicyId::new(value)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    StrumDisplay,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Permit,
    Forbid,
}

/// A head constraint on one of principal, action or resource.
///
/// `InSet` only occurs for actions (`action in [A, B]`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum ScopeConstraint {
    #[default]
    #[serde(rename = "All")]
    Any,
    #[serde(rename = "==")]
    Eq { entity: EntityUid },
    #[serde(rename = "in")]
    In { entity: EntityUid },
    #[serde(rename = "in_set")]
    InSet { entities: Vec<EntityUid> },
    #[serde(rename = "is")]
    Is { entity_type: EntityType },
    #[serde(rename = "is_in")]
    IsIn {
        entity_type: EntityType,
        entity: EntityUid,
    },
}

impl ScopeConstraint {
    pub fn eq(entity: EntityUid) -> Self {
        ScopeConstraint::Eq { entity }
    }

    pub fn is_in(entity: EntityUid) -> Self {
        ScopeConstraint::In { entity }
    }

    pub fn in_set(entities: impl IntoIterator<Item = EntityUid>) -> Self {
        ScopeConstraint::InSet {
            entities: entities.into_iter().collect(),
        }
    }

    pub fn is(entity_type: impl Into<EntityType>) -> Self {
        ScopeConstraint::Is {
            entity_type: entity_type.into(),
        }
    }

    pub fn is_type_in(entity_type: impl Into<EntityType>, entity: EntityUid) -> Self {
        ScopeConstraint::IsIn {
            entity_type: entity_type.into(),
            entity,
        }
    }

    /// The constraint as a condition on `var`, `None` for `Any`.
    pub fn to_expr(&self, var: Var) -> Option<Expr> {
        let slot = Expr::var(var);
        let expr = match self {
            ScopeConstraint::Any => return None,
            ScopeConstraint::Eq { entity } => slot.eq(Expr::entity(entity.clone())),
            ScopeConstraint::In { entity } => slot.is_in(Expr::entity(entity.clone())),
            ScopeConstraint::InSet { entities } => slot.is_in(Expr::val(Value::set(
                entities.iter().cloned().map(Value::Entity),
            ))),
            ScopeConstraint::Is { entity_type } => slot.is_type(entity_type.clone()),
            ScopeConstraint::IsIn {
                entity_type,
                entity,
            } => slot.is_type_in(entity_type.clone(), Expr::entity(entity.clone())),
        };
        Some(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scope {
    pub principal: ScopeConstraint,
    pub action: ScopeConstraint,
    pub resource: ScopeConstraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    When,
    Unless,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub body: Expr,
}

/// One permit or forbid statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    id: PolicyId,
    effect: Effect,
    scope: Scope,
    conditions: Vec<Condition>,
}

impl Policy {
    pub fn new(id: impl Into<PolicyId>, effect: Effect) -> Self {
        Policy {
            id: id.into(),
            effect,
            scope: Scope::default(),
            conditions: Vec::new(),
        }
    }

    pub fn permit(id: impl Into<PolicyId>) -> Self {
        Self::new(id, Effect::Permit)
    }

    pub fn forbid(id: impl Into<PolicyId>) -> Self {
        Self::new(id, Effect::Forbid)
    }

    pub fn principal(mut self, constraint: ScopeConstraint) -> Self {
        self.scope.principal = constraint;
        self
    }

    pub fn action(mut self, constraint: ScopeConstraint) -> Self {
        self.scope.action = constraint;
        self
    }

    pub fn resource(mut self, constraint: ScopeConstraint) -> Self {
        self.scope.resource = constraint;
        self
    }

    pub fn when(mut self, body: Expr) -> Self {
        self.conditions.push(Condition {
            kind: ConditionKind::When,
            body,
        });
        self
    }

    pub fn unless(mut self, body: Expr) -> Self {
        self.conditions.push(Condition {
            kind: ConditionKind::Unless,
            body,
        });
        self
    }

    pub fn id(&self) -> &PolicyId {
        &self.id
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl From<String> for PolicyId {
    fn from(value: String) -> Self {
        PolicyId(value)
    }
}

/// An ordered set of policies with unique ids.
///
/// Iteration follows insertion order, which is also the order diagnostics are
/// reported in.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    policies: Vec<Arc<Policy>>,
    index: HashMap<PolicyId, usize>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_policies(policies: impl IntoIterator<Item = Policy>) -> Result<Self, PolicyError> {
        let mut set = PolicySet::new();
        for policy in policies {
            set.add(policy)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, policy: Policy) -> Result<(), PolicyError> {
        if self.index.contains_key(policy.id()) {
            return Err(PolicyError::DuplicatePolicyId(policy.id().clone()));
        }
        self.index.insert(policy.id().clone(), self.policies.len());
        self.policies.push(Arc::new(policy));
        Ok(())
    }

    pub fn get(&self, id: &PolicyId) -> Option<&Policy> {
        self.index.get(id).map(|&idx| self.policies[idx].as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
