//! The condition expression tree.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::types::{EntityType, EntityUid, Value};

use super::pattern::Pattern;

/// The four request variables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Var {
    Principal,
    Action,
    Resource,
    Context,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "isEmpty")]
    IsEmpty,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum BinaryOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEq,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEq,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "containsAll")]
    ContainsAll,
    #[strum(serialize = "containsAny")]
    ContainsAny,
}

/// One node of a condition expression.
///
/// The tree is built once and only read afterwards, so a single tree can be
/// evaluated from many threads at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    Var(Var),
    GetAttr {
        expr: Box<Expr>,
        attr: String,
    },
    HasAttr {
        expr: Box<Expr>,
        attr: String,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    UnaryApp {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    BinaryApp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Is {
        expr: Box<Expr>,
        entity_type: EntityType,
    },
    /// `expr is T in parent`; `parent` is only evaluated when the type matches.
    IsIn {
        expr: Box<Expr>,
        entity_type: EntityType,
        parent: Box<Expr>,
    },
    Like {
        expr: Box<Expr>,
        pattern: Pattern,
    },
    Set(Vec<Expr>),
    /// Keys are unique when built through [`Expr::record`]. Evaluating a
    /// hand-built record with a repeated key keeps the last value.
    Record(Vec<(String, Expr)>),
    ExtensionCall {
        function: String,
        args: Vec<Expr>,
    },
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    pub fn val(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn long(n: i64) -> Self {
        Expr::Literal(Value::Long(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Value::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Expr::Literal(Value::Bool(b))
    }

    pub fn entity(uid: EntityUid) -> Self {
        Expr::Literal(Value::Entity(uid))
    }

    pub fn var(var: Var) -> Self {
        Expr::Var(var)
    }

    pub fn principal() -> Self {
        Expr::Var(Var::Principal)
    }

    pub fn action() -> Self {
        Expr::Var(Var::Action)
    }

    pub fn resource() -> Self {
        Expr::Var(Var::Resource)
    }

    pub fn context() -> Self {
        Expr::Var(Var::Context)
    }

    pub fn set(elems: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Set(elems.into_iter().collect())
    }

    /// A repeated key replaces the earlier value in place.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Expr)>) -> Self {
        let mut out: Vec<(String, Expr)> = Vec::new();
        for (key, value) in fields {
            let key = key.into();
            match out.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        Expr::Record(out)
    }

    pub fn call(function: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::ExtensionCall {
            function: function.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn ite(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn get_attr(self, attr: impl Into<String>) -> Self {
        Expr::GetAttr {
            expr: Box::new(self),
            attr: attr.into(),
        }
    }

    pub fn has_attr(self, attr: impl Into<String>) -> Self {
        Expr::HasAttr {
            expr: Box::new(self),
            attr: attr.into(),
        }
    }

    pub fn and(self, right: Expr) -> Self {
        Expr::And {
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn or(self, right: Expr) -> Self {
        Expr::Or {
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn not(self) -> Self {
        self.unary(UnaryOp::Not)
    }

    pub fn neg(self) -> Self {
        self.unary(UnaryOp::Neg)
    }

    pub fn is_empty(self) -> Self {
        self.unary(UnaryOp::IsEmpty)
    }

    pub fn unary(self, op: UnaryOp) -> Self {
        Expr::UnaryApp {
            op,
            arg: Box::new(self),
        }
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryApp {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn not_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    pub fn less(self, right: Expr) -> Self {
        self.binary(BinaryOp::Less, right)
    }

    pub fn less_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::LessEq, right)
    }

    pub fn greater(self, right: Expr) -> Self {
        self.binary(BinaryOp::Greater, right)
    }

    pub fn greater_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::GreaterEq, right)
    }

    pub fn add(self, right: Expr) -> Self {
        self.binary(BinaryOp::Add, right)
    }

    pub fn sub(self, right: Expr) -> Self {
        self.binary(BinaryOp::Sub, right)
    }

    pub fn mul(self, right: Expr) -> Self {
        self.binary(BinaryOp::Mul, right)
    }

    pub fn is_in(self, right: Expr) -> Self {
        self.binary(BinaryOp::In, right)
    }

    pub fn contains(self, right: Expr) -> Self {
        self.binary(BinaryOp::Contains, right)
    }

    pub fn contains_all(self, right: Expr) -> Self {
        self.binary(BinaryOp::ContainsAll, right)
    }

    pub fn contains_any(self, right: Expr) -> Self {
        self.binary(BinaryOp::ContainsAny, right)
    }

    pub fn is_type(self, entity_type: impl Into<EntityType>) -> Self {
        Expr::Is {
            expr: Box::new(self),
            entity_type: entity_type.into(),
        }
    }

    pub fn is_type_in(self, entity_type: impl Into<EntityType>, parent: Expr) -> Self {
        Expr::IsIn {
            expr: Box::new(self),
            entity_type: entity_type.into(),
            parent: Box::new(parent),
        }
    }

    pub fn like(self, pattern: Pattern) -> Self {
        Expr::Like {
            expr: Box::new(self),
            pattern,
        }
    }

    /// Method-call form of an extension function: `self.function(args..)`.
    pub fn method(self, function: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        let mut all = vec![self];
        all.extend(args);
        Expr::ExtensionCall {
            function: function.into(),
            args: all,
        }
    }

    /// Fold a list of conjuncts into a left-nested `&&` chain.
    pub(crate) fn conjunction(parts: impl IntoIterator<Item = Expr>) -> Self {
        parts
            .into_iter()
            .reduce(Expr::and)
            .unwrap_or(Expr::boolean(true))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_shapes() {
        let expr = Expr::resource()
            .get_attr("ip")
            .method("isInRange", [Expr::call("ip", [Expr::string("10.0.0.0/8")])]);

        let Expr::ExtensionCall { function, args } = expr else {
            panic!("expected extension call");
        };
        assert_eq!(function, "isInRange");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0], Expr::GetAttr { attr, .. } if attr == "ip"));
    }

    #[test]
    fn test_record_keys_are_unique() {
        let expr = Expr::record([
            ("a", Expr::long(1)),
            ("b", Expr::long(2)),
            ("a", Expr::long(3)),
        ]);
        assert_eq!(
            expr,
            Expr::Record(vec![
                ("a".to_string(), Expr::long(3)),
                ("b".to_string(), Expr::long(2)),
            ])
        );
    }

    #[test]
    fn test_conjunction() {
        assert_eq!(Expr::conjunction([]), Expr::boolean(true));
        assert_eq!(
            Expr::conjunction([Expr::boolean(false)]),
            Expr::boolean(false)
        );
        assert!(matches!(
            Expr::conjunction([Expr::principal(), Expr::action(), Expr::resource()]),
            Expr::And { .. }
        ));
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(BinaryOp::ContainsAll.to_string(), "containsAll");
        assert_eq!(UnaryOp::Not.as_ref(), "!");
        assert_eq!("context".parse::<Var>().unwrap(), Var::Context);
    }
}
