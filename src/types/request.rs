//! Authorization request type.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::ast::Var;
use crate::error::EvalError;

use super::{EntityUid, Record, Value};

/// The principal, action, resource and context of one authorization call.
///
/// Every slot may be left unknown (`None`). Concrete evaluation reports an
/// unknown slot as [`EvalError::UnboundVariable`]; partial evaluation keeps it
/// symbolic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub principal: Option<EntityUid>,
    pub action: Option<EntityUid>,
    pub resource: Option<EntityUid>,
    pub context: Option<Record>,
}

impl Request {
    /// A fully known request.
    pub fn new(principal: EntityUid, action: EntityUid, resource: EntityUid, context: Record) -> Self {
        Request {
            principal: Some(principal),
            action: Some(action),
            resource: Some(resource),
            context: Some(context),
        }
    }

    /// A request with every slot unknown.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, principal: EntityUid) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_action(mut self, action: EntityUid) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_resource(mut self, resource: EntityUid) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_context(mut self, context: Record) -> Self {
        self.context = Some(context);
        self
    }

    /// The entity bound to a principal, action or resource variable.
    pub fn entity_slot(&self, var: Var) -> Option<&EntityUid> {
        match var {
            Var::Principal => self.principal.as_ref(),
            Var::Action => self.action.as_ref(),
            Var::Resource => self.resource.as_ref(),
            Var::Context => None,
        }
    }

    /// The value of `var`, `None` if the slot is unknown.
    pub fn get(&self, var: Var) -> Option<Value> {
        match var {
            Var::Context => self.context.clone().map(Value::Record),
            slot => self.entity_slot(slot).cloned().map(Value::Entity),
        }
    }

    /// The value of `var`, failing with `UnboundVariable` if it is unknown.
    pub fn lookup(&self, var: Var) -> Result<Value, EvalError> {
        self.get(var).ok_or(EvalError::UnboundVariable(var))
    }

    pub fn is_known(&self, var: Var) -> bool {
        match var {
            Var::Context => self.context.is_some(),
            slot => self.entity_slot(slot).is_some(),
        }
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        fn slot(uid: &Option<EntityUid>) -> String {
            uid.as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "?".to_string())
        }
        write!(
            f,
            "principal={}, action={}, resource={}",
            slot(&self.principal),
            slot(&self.action),
            slot(&self.resource)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;

    fn request() -> Request {
        Request::new(
            EntityUid::new("User", "alice"),
            EntityUid::new("Action", "view"),
            EntityUid::new("Photo", "VacationPhoto94.jpg"),
            Record::from([("mfa".to_string(), Value::Bool(true))]),
        )
    }

    #[test]
    fn test_request_serialization() {
        assert_json_snapshot!(request(), @r#"
        {
          "principal": {
            "type": "User",
            "id": "alice"
          },
          "action": {
            "type": "Action",
            "id": "view"
          },
          "resource": {
            "type": "Photo",
            "id": "VacationPhoto94.jpg"
          },
          "context": {
            "mfa": {
              "Bool": true
            }
          }
        }
        "#);
    }

    #[test]
    fn test_lookup_known_and_unknown() {
        let request = Request::unknown().with_action(EntityUid::new("Action", "view"));
        assert_eq!(
            request.lookup(Var::Action),
            Ok(Value::Entity(EntityUid::new("Action", "view")))
        );
        assert_eq!(
            request.lookup(Var::Principal),
            Err(EvalError::UnboundVariable(Var::Principal))
        );
        assert!(!request.is_known(Var::Context));
    }

    #[test]
    fn test_context_as_record() {
        let value = request().lookup(Var::Context).unwrap();
        assert_eq!(value, Value::record([("mfa", Value::Bool(true))]));
    }

    #[test]
    fn test_request_display() {
        let request = Request::unknown().with_principal(EntityUid::new("User", "alice"));
        assert_eq!(
            request.to_string(),
            r#"principal=User::"alice", action=?, resource=?"#
        );
    }
}
