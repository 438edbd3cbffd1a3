//! Policy combination: forbid overrides permit, default deny.

use tracing::{debug, info, trace, warn};

use crate::ast::{Effect, PolicySet};
use crate::config::EvaluationLimits;
use crate::partial::{PartialEvaluator, PartialOutcome};
use crate::policy_eval::{PolicyOutcome, is_satisfied_with_limits};
use crate::traits::EntitySource;
use crate::types::{
    Decision, PartialResponse, PolicyEvaluationError, Request, ResidualPolicy, Response,
};

/// Runs every policy in a set and combines the outcomes.
///
/// Every policy is evaluated, even once a forbid is known to be satisfied,
/// so the response lists all determining and erroring policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authorizer {
    limits: EvaluationLimits,
}

impl Authorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EvaluationLimits) -> Self {
        Authorizer { limits }
    }

    pub fn limits(&self) -> EvaluationLimits {
        self.limits
    }

    pub fn is_authorized<S>(&self, policies: &PolicySet, request: &Request, entities: &S) -> Response
    where
        S: EntitySource + ?Sized,
    {
        debug!(
            event = "Authorize",
            phase = "Start",
            request = request.to_string(),
            policies = policies.len()
        );

        let mut permits = Vec::new();
        let mut forbids = Vec::new();
        let mut errors = Vec::new();

        for policy in policies.iter() {
            let outcome = is_satisfied_with_limits(policy, request, entities, self.limits);
            trace!(
                event = "Authorize",
                phase = "Policy",
                policy = policy.id().as_str(),
                effect = policy.effect().as_ref(),
                outcome = ?outcome
            );

            match outcome {
                PolicyOutcome::Satisfied => match policy.effect() {
                    Effect::Permit => permits.push(policy.id().clone()),
                    Effect::Forbid => forbids.push(policy.id().clone()),
                },
                PolicyOutcome::NotSatisfied => {}
                PolicyOutcome::Errored(error) => {
                    warn!(
                        event = "Authorize",
                        phase = "PolicyError",
                        policy = policy.id().as_str(),
                        error = error.to_string()
                    );
                    errors.push(PolicyEvaluationError {
                        policy_id: policy.id().clone(),
                        error,
                    });
                }
            }
        }

        let decision = if forbids.is_empty() && !permits.is_empty() {
            Decision::Allow
        } else {
            Decision::Deny
        };

        let response = Response {
            decision,
            determining_permits: permits,
            determining_forbids: forbids,
            errors,
        };

        debug!(
            event = "Authorize",
            phase = "Result",
            decision = response.decision.as_ref(),
            errors = response.errors.len()
        );
        for reason in response.reason() {
            info!(
                event = "Authorize",
                phase = "Determining",
                decision = response.decision.as_ref(),
                policy = reason.as_str()
            );
        }

        response
    }

    /// Authorize a request whose slots may be unknown.
    ///
    /// The decision is only set when no residual policy could change it: a
    /// satisfied forbid always denies, a satisfied permit allows once no
    /// forbid is left residual, and nothing left to permit denies.
    pub fn is_authorized_partial<S>(
        &self,
        policies: &PolicySet,
        request: &Request,
        entities: &S,
    ) -> PartialResponse
    where
        S: EntitySource + ?Sized,
    {
        debug!(
            event = "Authorize",
            phase = "PartialStart",
            request = request.to_string(),
            policies = policies.len()
        );

        let evaluator = PartialEvaluator::new(request, entities).with_limits(self.limits);
        let mut response = PartialResponse {
            decision: None,
            satisfied_permits: Vec::new(),
            satisfied_forbids: Vec::new(),
            residuals: Vec::new(),
            errors: Vec::new(),
        };

        for policy in policies.iter() {
            let outcome = evaluator.policy_outcome(policy);
            trace!(
                event = "Authorize",
                phase = "PartialPolicy",
                policy = policy.id().as_str(),
                outcome = ?outcome
            );

            match outcome {
                PartialOutcome::Known(PolicyOutcome::Satisfied) => match policy.effect() {
                    Effect::Permit => response.satisfied_permits.push(policy.id().clone()),
                    Effect::Forbid => response.satisfied_forbids.push(policy.id().clone()),
                },
                PartialOutcome::Known(PolicyOutcome::NotSatisfied) => {}
                PartialOutcome::Known(PolicyOutcome::Errored(error)) => {
                    warn!(
                        event = "Authorize",
                        phase = "PolicyError",
                        policy = policy.id().as_str(),
                        error = error.to_string()
                    );
                    response.errors.push(PolicyEvaluationError {
                        policy_id: policy.id().clone(),
                        error,
                    });
                }
                PartialOutcome::Residual(condition) => response.residuals.push(ResidualPolicy {
                    policy_id: policy.id().clone(),
                    effect: policy.effect(),
                    condition,
                }),
            }
        }

        let residual = |effect: Effect| response.residuals.iter().any(|r| r.effect == effect);
        let permitted = !response.satisfied_permits.is_empty();

        response.decision = if !response.satisfied_forbids.is_empty() {
            Some(Decision::Deny)
        } else if permitted && !residual(Effect::Forbid) {
            Some(Decision::Allow)
        } else if !permitted && !residual(Effect::Permit) {
            Some(Decision::Deny)
        } else {
            None
        };

        debug!(
            event = "Authorize",
            phase = "PartialResult",
            decision = ?response.decision,
            residuals = response.residuals.len()
        );

        response
    }
}
