#[test]
fn test_policies_returns_set_order() {
    let engine = engine(forbid_policies());
    let policies = engine.policies().unwrap();
    let listed: Vec<&str> = policies.iter().map(|p| p.id().as_str()).collect();
    assert_eq!(
        listed,
        vec!["alice_photo", "bob_photo", "alice_no_edit", "nobody_deletes"]
    );
    assert_eq!(policies[2].effect(), Effect::Forbid);
}

#[test]
fn test_empty_policy_set_denies() {
    let engine = PolicyEngine::new(PolicySet::new());
    let response = engine
        .evaluate(&user_request("alice", "view", vacation_photo()), &directory())
        .unwrap();
    assert_deny(&response);
    assert!(response.reason().is_empty());
}

#[test]
fn test_clones_share_policy_set() {
    let engine = engine(photo_policies());
    let clone = engine.clone();
    engine.reload(PolicySet::new()).unwrap();

    let response = clone
        .evaluate(&user_request("alice", "view", vacation_photo()), &directory())
        .unwrap();
    assert_deny(&response);
}

#[test]
fn test_limits_are_applied() {
    let deep = (0..20).fold(Expr::boolean(true), |expr, _| expr.not().not());
    let engine = engine(vec![Policy::permit("deep").when(deep)])
        .with_limits(EvaluationLimits::with_max_depth(8));
    assert_eq!(engine.limits().max_depth, 8);

    let response = engine
        .evaluate(&user_request("alice", "view", vacation_photo()), &directory())
        .unwrap();
    assert_deny(&response);
    assert!(matches!(
        response.errors[0].error,
        crate::error::EvalError::RecursionLimit { max: 8 }
    ));
}

#[test]
fn test_concurrent_evaluation() {
    use std::thread;

    let engine = Arc::new(engine(group_policies()));
    let entities = Arc::new(directory());
    let mut handles = vec![];

    for i in 0..10 {
        let engine = Arc::clone(&engine);
        let entities = Arc::clone(&entities);
        handles.push(thread::spawn(move || {
            let user = if i % 2 == 0 { "admin_user" } else { "regular_user" };
            for _ in 0..100 {
                let response = engine
                    .evaluate(&user_request(user, "view", vacation_photo()), entities.as_ref())
                    .unwrap();
                assert!(response.is_allowed());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PolicyEngine>();
}

#[test]
fn test_invalid_uid_is_a_format_error() {
    let result = "Alice".parse::<EntityUid>();
    assert!(matches!(result, Err(PolicyError::InvalidFormat(_))));
}
