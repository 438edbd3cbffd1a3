//! Metrics integration.
//!
//! The sink is process-wide and can only be installed once, so this is the
//! only test that installs one. It filters on its own principal because
//! other tests evaluate concurrently.

use std::sync::{Arc, Mutex};

use crate::ast::{Expr, Policy, PolicySet, ScopeConstraint};
use crate::metrics::{self, EvaluationPhases, EvaluationStats, MetricsSink, ReloadStats};
use crate::{Entities, EntityUid, PolicyEngine, Record, Request};

const PROBE: &str = "metrics_probe";

#[derive(Default)]
struct RecordingSink {
    evaluations: Mutex<Vec<EvaluationStats>>,
    phases: Mutex<Vec<EvaluationPhases>>,
    reloads: Mutex<Vec<ReloadStats>>,
}

fn is_probe(stats: &EvaluationStats) -> bool {
    stats.principal_id.contains(PROBE)
}

impl MetricsSink for RecordingSink {
    fn on_evaluation(&self, stats: &EvaluationStats) {
        if is_probe(stats) {
            self.evaluations.lock().unwrap().push(stats.clone());
        }
    }

    fn on_reload(&self, stats: &ReloadStats) {
        self.reloads.lock().unwrap().push(stats.clone());
    }

    fn on_evaluation_phases(&self, stats: &EvaluationStats, phases: &EvaluationPhases) {
        if is_probe(stats) {
            self.phases.lock().unwrap().push(phases.clone());
        }
    }
}

fn probe_request(action: &str) -> Request {
    Request::new(
        EntityUid::new("User", PROBE),
        EntityUid::new("Action", action),
        EntityUid::new("Photo", "a.jpg"),
        Record::new(),
    )
}

#[test]
fn test_engine_reports_to_installed_sink() {
    let sink = Arc::new(RecordingSink::default());
    metrics::set_sink(sink.clone());

    let policies = PolicySet::from_policies([
        Policy::permit("probe_view")
            .principal(ScopeConstraint::eq(EntityUid::new("User", PROBE)))
            .action(ScopeConstraint::eq(EntityUid::new("Action", "view"))),
        Policy::permit("broken").when(Expr::long(1)),
    ])
    .unwrap();
    let engine = PolicyEngine::new(policies);
    let entities = Entities::empty();

    engine.evaluate(&probe_request("view"), &entities).unwrap();
    engine.evaluate(&probe_request("edit"), &entities).unwrap();
    engine
        .evaluate_partial(
            &Request::unknown().with_principal(EntityUid::new("User", PROBE)),
            &entities,
        )
        .unwrap();
    engine.reload(PolicySet::new()).unwrap();

    // A second sink is ignored.
    metrics::set_sink(Arc::new(RecordingSink::default()));
    engine.evaluate(&probe_request("view"), &entities).unwrap();

    let evaluations = sink.evaluations.lock().unwrap();
    let outcomes: Vec<(bool, &str, usize)> = evaluations
        .iter()
        .map(|s| (s.allowed, s.action_id.as_str(), s.errors))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (true, r#"Action::"view""#, 1),
            (false, r#"Action::"edit""#, 1),
            (false, "?", 1),
            (false, r#"Action::"view""#, 0),
        ]
    );

    let phases = sink.phases.lock().unwrap();
    assert_eq!(phases.len(), 4);
    assert!(phases.iter().all(|p| p.total_ms >= p.authorize_ms));

    let reloads = sink.reloads.lock().unwrap();
    assert!(reloads.iter().any(|r| r.policies == 0));
}
