use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::ast::{Policy, PolicySet};
use crate::authorizer::Authorizer;
use crate::config::EvaluationLimits;
use crate::error::PolicyError;
use crate::metrics::{self, EvaluationStats};
use crate::scope::principal_match_reason;
use crate::timers::{EvaluationTimings, PhaseTimer};
use crate::traits::EntitySource;
use crate::types::{
    Decision, EntityUid, PartialResponse, PolicyEffectFilter, PolicyMatch, PrincipalPolicies,
    Request, Response,
};

#[cfg(test)]
mod tests;

/// The main engine handle. Cloneable and thread-safe.
///
/// Clones share the same policy set, so a reload through any handle is seen
/// by all of them.
#[derive(Clone)]
pub struct PolicyEngine {
    inner: Arc<RwLock<PolicySet>>,
    authorizer: Authorizer,
}

impl PolicyEngine {
    pub fn new(policies: PolicySet) -> Self {
        PolicyEngine {
            inner: Arc::new(RwLock::new(policies)),
            authorizer: Authorizer::new(),
        }
    }

    pub fn with_limits(mut self, limits: EvaluationLimits) -> Self {
        self.authorizer = Authorizer::with_limits(limits);
        self
    }

    pub fn limits(&self) -> EvaluationLimits {
        self.authorizer.limits()
    }

    /// Swap in a new policy set. In-flight evaluations finish against the old one.
    pub fn reload(&self, policies: PolicySet) -> Result<(), PolicyError> {
        let count = policies.len();
        *self.inner.write()? = policies;

        info!(event = "Reload", phase = "Complete", policies = count);
        metrics::record_reload(count);
        Ok(())
    }

    pub fn evaluate<S>(&self, request: &Request, entities: &S) -> Result<Response, PolicyError>
    where
        S: EntitySource + ?Sized,
    {
        debug!(
            event = "Request",
            phase = "Evaluation",
            request = request.to_string()
        );

        let mut timings = EvaluationTimings::start();
        let guard = {
            let _timer = PhaseTimer::new(&mut timings.lock);
            self.inner.read()?
        };
        let response = {
            let _timer = PhaseTimer::new(&mut timings.authorize);
            self.authorizer.is_authorized(&guard, request, entities)
        };
        drop(guard);

        debug!(
            event = "Request",
            phase = "Result",
            result = response.to_string()
        );
        record(request, response.is_allowed(), response.errors.len(), &timings);
        Ok(response)
    }

    /// Evaluate a request that may leave principal, action, resource or
    /// context unknown.
    pub fn evaluate_partial<S>(
        &self,
        request: &Request,
        entities: &S,
    ) -> Result<PartialResponse, PolicyError>
    where
        S: EntitySource + ?Sized,
    {
        debug!(
            event = "Request",
            phase = "PartialEvaluation",
            request = request.to_string()
        );

        let mut timings = EvaluationTimings::start();
        let guard = {
            let _timer = PhaseTimer::new(&mut timings.lock);
            self.inner.read()?
        };
        let response = {
            let _timer = PhaseTimer::new(&mut timings.authorize);
            self.authorizer.is_authorized_partial(&guard, request, entities)
        };
        drop(guard);

        debug!(
            event = "Request",
            phase = "PartialResult",
            decision = ?response.decision,
            residuals = response.residuals.len()
        );
        let allowed = response.decision == Some(Decision::Allow);
        record(request, allowed, response.errors.len(), &timings);
        Ok(response)
    }

    /// List the policies whose principal constraint admits `principal`,
    /// taking its ancestors in `entities` into account.
    pub fn list_policies_for_principal<S>(
        &self,
        principal: &EntityUid,
        entities: &S,
        filter: PolicyEffectFilter,
    ) -> Result<PrincipalPolicies, PolicyError>
    where
        S: EntitySource + ?Sized,
    {
        let guard = self.inner.read()?;

        let matches = guard
            .iter()
            .filter(|policy| filter.matches(policy.effect()))
            .filter_map(|policy| {
                principal_match_reason(&policy.scope().principal, principal, entities).map(
                    |reason| PolicyMatch {
                        policy: policy.clone(),
                        reason,
                    },
                )
            })
            .collect::<Vec<_>>();

        debug!(
            event = "List",
            phase = "Result",
            principal = principal.to_string(),
            filter = filter.to_string(),
            matches = matches.len()
        );

        Ok(PrincipalPolicies::new(principal.clone(), matches))
    }

    pub fn policies(&self) -> Result<Vec<Policy>, PolicyError> {
        let guard = self.inner.read()?;
        Ok(guard.iter().cloned().collect())
    }
}

fn record(request: &Request, allowed: bool, errors: usize, timings: &EvaluationTimings) {
    let slot = |uid: Option<&EntityUid>| uid.map_or_else(|| "?".to_string(), EntityUid::to_string);
    let duration = timings.elapsed();
    let stats = EvaluationStats {
        duration,
        allowed,
        principal_id: slot(request.principal.as_ref()),
        action_id: slot(request.action.as_ref()),
        errors,
    };
    metrics::record_evaluation(&stats, &timings.phases(duration));
}
