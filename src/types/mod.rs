//! Data model types: values, entities, requests and decisions.
//!
//! Canonical string forms:
//! - Entity uid: `User::"alice"` or `NS::User::"alice"`
//! - Entity type: `User` or `NS::User`
//!
//! Values render in policy-language literal form, e.g. `ip("10.0.0.0/8")`.

mod decision;
mod entity;
mod entity_uid;
mod principal_policies;
mod request;
mod value;

pub use decision::{Decision, PartialResponse, PolicyEvaluationError, ResidualPolicy, Response};
pub use entity::{Entities, Entity};
pub use entity_uid::{EntityType, EntityUid};
pub use principal_policies::{
    PolicyEffectFilter, PolicyMatch, PolicyMatchReason, PrincipalPolicies,
};
pub use request::Request;
pub use value::{Record, Set, Type, Value};
