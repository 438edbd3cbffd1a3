use std::sync::Arc;

use super::*;
use crate::ast::{Effect, Expr, Pattern, PolicyId, ScopeConstraint};
use crate::extensions::IpAddr;
use crate::types::{Entities, Entity, PolicyMatchReason, Record, Value};
use insta::assert_json_snapshot;
use yare::parameterized;


fn uid(ty: &str, id: &str) -> EntityUid {
    EntityUid::new(ty, id)
}

fn action(name: &str) -> EntityUid {
    uid("Action", name)
}

fn actions(names: &[&str]) -> ScopeConstraint {
    ScopeConstraint::in_set(names.iter().map(|name| action(name)))
}

fn vacation_photo() -> EntityUid {
    uid("Photo", "VacationPhoto94.jpg")
}

fn set(policies: impl IntoIterator<Item = Policy>) -> PolicySet {
    PolicySet::from_policies(policies).expect("policy ids should be unique")
}

fn photo_policies() -> Vec<Policy> {
    vec![
        Policy::permit("alice_photo")
            .principal(ScopeConstraint::eq(uid("User", "alice")))
            .action(actions(&["view", "edit", "delete"]))
            .resource(ScopeConstraint::eq(vacation_photo())),
        Policy::permit("bob_photo")
            .principal(ScopeConstraint::eq(uid("User", "bob")))
            .action(ScopeConstraint::eq(action("view")))
            .resource(ScopeConstraint::eq(vacation_photo())),
    ]
}

fn forbid_policies() -> Vec<Policy> {
    let mut policies = photo_policies();
    policies.push(
        Policy::forbid("alice_no_edit")
            .principal(ScopeConstraint::eq(uid("User", "alice")))
            .action(ScopeConstraint::eq(action("edit")))
            .resource(ScopeConstraint::eq(vacation_photo())),
    );
    policies.push(
        Policy::forbid("nobody_deletes")
            .action(ScopeConstraint::eq(action("delete")))
            .resource(ScopeConstraint::eq(vacation_photo())),
    );
    policies
}

fn in_range(attr: &str, cidr: &str) -> Expr {
    Expr::resource()
        .get_attr(attr)
        .method("isInRange", [Expr::call("ip", [Expr::string(cidr)])])
}

fn host_policies() -> Vec<Policy> {
    vec![
        Policy::permit("alice_web_hosts")
            .principal(ScopeConstraint::eq(uid("User", "alice")))
            .action(ScopeConstraint::eq(action("create_host")))
            .resource(ScopeConstraint::is("Host"))
            .when(
                Expr::resource()
                    .get_attr("name")
                    .like(Pattern::parse("web*"))
                    .and(in_range("ip", "192.0.1.0/24")),
            ),
        Policy::permit("bob_hosts")
            .principal(ScopeConstraint::eq(uid("User", "bob")))
            .action(ScopeConstraint::eq(action("create_host")))
            .resource(ScopeConstraint::is("Host"))
            .when(
                Expr::resource()
                    .get_attr("name")
                    .like(Pattern::parse("bob*"))
                    .and(in_range("ip", "192.0.0.0/24")),
            ),
    ]
}

fn group_policies() -> Vec<Policy> {
    vec![
        Policy::permit("admins_photos")
            .principal(ScopeConstraint::is_in(uid("Group", "admins")))
            .action(actions(&["delete", "view"]))
            .resource(ScopeConstraint::is("Photo")),
        Policy::permit("users_photos")
            .principal(ScopeConstraint::is_in(uid("Group", "users")))
            .action(ScopeConstraint::eq(action("view")))
            .resource(ScopeConstraint::is("Photo")),
    ]
}

fn is_policies() -> Vec<Policy> {
    vec![
        Policy::permit("users_read")
            .principal(ScopeConstraint::is("User"))
            .action(ScopeConstraint::eq(action("read"))),
        Policy::permit("admin_users_write")
            .principal(ScopeConstraint::is_type_in("User", uid("Group", "admins")))
            .action(ScopeConstraint::eq(action("write"))),
        Policy::permit("groups_read")
            .principal(ScopeConstraint::is("Group"))
            .action(ScopeConstraint::eq(action("group_read"))),
        Policy::permit("admin_groups_write")
            .principal(ScopeConstraint::is_type_in("Group", uid("Group", "admins")))
            .action(ScopeConstraint::eq(action("group_write"))),
    ]
}

fn engine(policies: Vec<Policy>) -> PolicyEngine {
    PolicyEngine::new(set(policies))
}

/// `users` nests inside `admins`' parent `staff`, `eve` is in both groups.
fn directory() -> Entities {
    Entities::from_entities([
        Entity::with_uid(uid("User", "alice")),
        Entity::with_uid(uid("User", "bob")),
        Entity::with_uid(uid("User", "admin_user")).with_parent(uid("Group", "admins")),
        Entity::with_uid(uid("User", "regular_user")).with_parent(uid("Group", "users")),
        Entity::with_uid(uid("User", "eve"))
            .with_parent(uid("Group", "admins"))
            .with_parent(uid("Group", "users")),
        Entity::with_uid(uid("Group", "admins")).with_parent(uid("Group", "staff")),
        Entity::with_uid(uid("Group", "users")).with_parent(uid("Group", "staff")),
        Entity::with_uid(uid("Group", "ops")).with_parent(uid("Group", "admins")),
        Entity::with_uid(vacation_photo()),
    ])
    .expect("directory uids should be unique")
}

fn host(name: &str, ip: &str) -> Entity {
    Entity::with_uid(uid("Host", name))
        .with_attr("name", name)
        .with_attr("ip", Value::IpAddr(ip.parse::<IpAddr>().expect("valid address")))
}

fn request(principal: EntityUid, action_name: &str, resource: EntityUid) -> Request {
    Request::new(principal, action(action_name), resource, Record::new())
}

fn user_request(user: &str, action_name: &str, resource: EntityUid) -> Request {
    request(uid("User", user), action_name, resource)
}

fn ids(ids: &[&str]) -> Vec<PolicyId> {
    ids.iter().map(|id| PolicyId::new(*id)).collect()
}

fn assert_allow(response: &Response) {
    assert_eq!(response.decision, Decision::Allow, "{response}");
}

fn assert_deny(response: &Response) {
    assert_eq!(response.decision, Decision::Deny, "{response}");
}

include!("core.rs");
include!("evaluate.rs");
include!("listing.rs");
