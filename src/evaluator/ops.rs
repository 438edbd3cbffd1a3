//! Operator semantics on already evaluated operands.
//!
//! Shared by the concrete and the partial evaluator, so both agree on every
//! type rule and failure.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Pattern, UnaryOp};
use crate::error::EvalError;
use crate::traits::EntitySource;
use crate::types::{EntityType, Type, Value};

const ORDERED: [Type; 4] = [Type::Long, Type::Decimal, Type::Datetime, Type::Duration];

pub(crate) fn apply_unary(op: UnaryOp, arg: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!arg.as_bool()?)),
        UnaryOp::Neg => {
            let n = arg.as_long()?;
            n.checked_neg()
                .map(Value::Long)
                .ok_or_else(|| EvalError::overflow(format!("-({n})")))
        }
        UnaryOp::IsEmpty => Ok(Value::Bool(arg.as_set()?.is_empty())),
    }
}

pub(crate) fn apply_binary<S>(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    entities: &S,
) -> Result<Value, EvalError>
where
    S: EntitySource + ?Sized,
{
    let value = match op {
        BinaryOp::Eq => Value::Bool(left == right),
        BinaryOp::NotEq => Value::Bool(left != right),
        BinaryOp::Less => Value::Bool(compare(left, right)?.is_lt()),
        BinaryOp::LessEq => Value::Bool(compare(left, right)?.is_le()),
        BinaryOp::Greater => Value::Bool(compare(left, right)?.is_gt()),
        BinaryOp::GreaterEq => Value::Bool(compare(left, right)?.is_ge()),
        BinaryOp::Add => arithmetic(op, left, right, i64::checked_add)?,
        BinaryOp::Sub => arithmetic(op, left, right, i64::checked_sub)?,
        BinaryOp::Mul => arithmetic(op, left, right, i64::checked_mul)?,
        BinaryOp::In => Value::Bool(entity_in(left, right, entities)?),
        BinaryOp::Contains => Value::Bool(left.as_set()?.contains(right)),
        BinaryOp::ContainsAll => {
            let haystack = left.as_set()?;
            Value::Bool(right.as_set()?.is_subset(haystack))
        }
        BinaryOp::ContainsAny => Value::Bool(left.as_set()?.intersects(right.as_set()?)),
    };
    Ok(value)
}

/// Order two values of the same ordered type.
fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Long(a), Value::Long(b)) => Ok(a.cmp(b)),
        (Value::Decimal(a), Value::Decimal(b)) => Ok(a.cmp(b)),
        (Value::Datetime(a), Value::Datetime(b)) => Ok(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Ok(a.cmp(b)),
        (l, r) if ORDERED.contains(&l.type_of()) => {
            Err(EvalError::type_mismatch([l.type_of()], r.type_of()))
        }
        (l, _) => Err(EvalError::type_mismatch(ORDERED, l.type_of())),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    checked: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (a, b) = (left.as_long()?, right.as_long()?);
    checked(a, b)
        .map(Value::Long)
        .ok_or_else(|| EvalError::overflow(format!("{a} {op} {b}")))
}

/// `left in right`, where `right` is an entity or a set of entities.
pub(crate) fn entity_in<S>(left: &Value, right: &Value, entities: &S) -> Result<bool, EvalError>
where
    S: EntitySource + ?Sized,
{
    let uid = left.as_entity()?;
    match right {
        Value::Entity(target) => Ok(entities.is_descendant_of(uid, target)),
        Value::Set(targets) => {
            let mut found = false;
            for target in targets {
                found |= entities.is_descendant_of(uid, target.as_entity()?);
            }
            Ok(found)
        }
        other => Err(EvalError::type_mismatch(
            [Type::Entity, Type::Set],
            other.type_of(),
        )),
    }
}

pub(crate) fn get_attr<S>(base: &Value, attr: &str, entities: &S) -> Result<Value, EvalError>
where
    S: EntitySource + ?Sized,
{
    let missing = |detail: String| EvalError::AttributeAccess {
        attr: attr.to_string(),
        detail,
    };

    match base {
        Value::Record(record) => record
            .get(attr)
            .cloned()
            .ok_or_else(|| missing("record does not have this attribute".to_string())),
        Value::Entity(uid) => {
            let entity = entities
                .entity(uid)
                .ok_or_else(|| EvalError::EntityNotFound(uid.clone()))?;
            entity
                .attr(attr)
                .cloned()
                .ok_or_else(|| missing(format!("{uid} does not have this attribute")))
        }
        other => Err(missing(format!(
            "expected a record or entity, got {}",
            other.type_of()
        ))),
    }
}

/// Presence test; an entity missing from the store has no attributes.
pub(crate) fn has_attr<S>(base: &Value, attr: &str, entities: &S) -> Result<bool, EvalError>
where
    S: EntitySource + ?Sized,
{
    match base {
        Value::Record(record) => Ok(record.contains_key(attr)),
        Value::Entity(uid) => Ok(entities
            .entity(uid)
            .is_some_and(|entity| entity.attr(attr).is_some())),
        other => Err(EvalError::type_mismatch(
            [Type::Record, Type::Entity],
            other.type_of(),
        )),
    }
}

pub(crate) fn is_type(value: &Value, entity_type: &EntityType) -> Result<bool, EvalError> {
    Ok(value.as_entity()?.entity_type() == entity_type)
}

pub(crate) fn like(value: &Value, pattern: &Pattern) -> Result<bool, EvalError> {
    Ok(pattern.matches(value.as_str()?))
}
