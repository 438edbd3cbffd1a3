//! Authorization decisions and the diagnostics that come with them.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use utoipa::ToSchema;

use crate::ast::{Effect, Expr, PolicyId};
use crate::error::EvalError;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, AsRefStr,
)]
pub enum Decision {
    Allow,
    Deny,
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_ref())
    }
}

/// A policy whose conditions failed to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PolicyEvaluationError {
    pub policy_id: PolicyId,
    #[schema(value_type = Object)]
    pub error: EvalError,
}

impl Display for PolicyEvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.policy_id, self.error)
    }
}

/// The outcome of authorizing one request against a policy set.
///
/// `determining_permits` and `determining_forbids` hold every satisfied
/// policy of that effect, in policy-set order. `errors` holds every
/// policy that errored, also in policy-set order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Response {
    pub decision: Decision,
    pub determining_permits: Vec<PolicyId>,
    pub determining_forbids: Vec<PolicyId>,
    pub errors: Vec<PolicyEvaluationError>,
}

impl Response {
    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// The policies that decided the outcome: the satisfied permits on
    /// `Allow`, the satisfied forbids on `Deny`. Empty on a default deny.
    pub fn reason(&self) -> &[PolicyId] {
        match self.decision {
            Decision::Allow => &self.determining_permits,
            Decision::Deny => &self.determining_forbids,
        }
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let reason = self.reason();
        if reason.is_empty() {
            write!(f, "{}(default)", self.decision)?;
        } else {
            write!(f, "{}({})", self.decision, reason.iter().join(", "))?;
        }
        if !self.errors.is_empty() {
            write!(f, " with {} error(s)", self.errors.len())?;
        }
        Ok(())
    }
}

/// A policy whose outcome depends on unknown request slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ResidualPolicy {
    pub policy_id: PolicyId,
    pub effect: Effect,
    /// What the policy's scope and conditions reduce to once every known
    /// value is folded in.
    #[schema(value_type = Object)]
    pub condition: Expr,
}

/// The outcome of authorizing a request with unknown slots.
///
/// `decision` is only set when no residual policy could change it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PartialResponse {
    pub decision: Option<Decision>,
    pub satisfied_permits: Vec<PolicyId>,
    pub satisfied_forbids: Vec<PolicyId>,
    pub residuals: Vec<ResidualPolicy>,
    pub errors: Vec<PolicyEvaluationError>,
}

impl PartialResponse {
    pub fn is_decided(&self) -> bool {
        self.decision.is_some()
    }
}
