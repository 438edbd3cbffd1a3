//! Partial evaluation over requests with unknown slots.
//!
//! Everything that can be computed from the known slots is folded into
//! literals; what depends on an unknown slot is returned as a residual
//! expression. Evaluating a residual once the missing slots are known gives
//! the same result the original expression would have given.

use serde::{Deserialize, Serialize};

use crate::ast::{ConditionKind, Expr, Policy, Var};
use crate::config::EvaluationLimits;
use crate::error::EvalError;
use crate::evaluator::ops;
use crate::extensions::ExtensionFunction;
use crate::policy_eval::PolicyOutcome;
use crate::scope::constraint_matches;
use crate::traits::EntitySource;
use crate::types::{Record, Request, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialValue {
    Value(Value),
    Residual(Expr),
}

impl PartialValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PartialValue::Value(value) => Some(value),
            PartialValue::Residual(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, PartialValue::Value(_))
    }

    pub fn is_residual(&self) -> bool {
        matches!(self, PartialValue::Residual(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            PartialValue::Value(value) => Some(value),
            PartialValue::Residual(_) => None,
        }
    }

    /// The expression form: known values become literals.
    pub fn into_expr(self) -> Expr {
        match self {
            PartialValue::Value(value) => Expr::Literal(value),
            PartialValue::Residual(expr) => expr,
        }
    }
}

/// The partial counterpart of [`PolicyOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialOutcome {
    Known(PolicyOutcome),
    /// Satisfied iff this expression evaluates to `true`.
    Residual(Expr),
}

pub struct PartialEvaluator<'e, S: EntitySource + ?Sized> {
    request: &'e Request,
    entities: &'e S,
    limits: EvaluationLimits,
}

impl<'e, S: EntitySource + ?Sized> PartialEvaluator<'e, S> {
    pub fn new(request: &'e Request, entities: &'e S) -> Self {
        PartialEvaluator {
            request,
            entities,
            limits: EvaluationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EvaluationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<PartialValue, EvalError> {
        self.partial(expr, 0)
    }

    /// Decide a policy as far as the known slots allow.
    ///
    /// Scope constraints on unknown slots become leading conjuncts of the
    /// residual. A clause that errors after a residual conjunct is kept
    /// unevaluated, since the earlier conjunct may rule the policy out first.
    pub fn policy_outcome(&self, policy: &Policy) -> PartialOutcome {
        let scope = policy.scope();
        let mut conjuncts: Vec<Expr> = Vec::new();

        for (var, constraint) in [
            (Var::Principal, &scope.principal),
            (Var::Action, &scope.action),
            (Var::Resource, &scope.resource),
        ] {
            match self.request.entity_slot(var) {
                Some(uid) => {
                    if !constraint_matches(constraint, Some(uid), self.entities) {
                        return PartialOutcome::Known(PolicyOutcome::NotSatisfied);
                    }
                }
                None => conjuncts.extend(constraint.to_expr(var)),
            }
        }

        for condition in policy.conditions() {
            let required = condition.kind == ConditionKind::When;
            let clause = |body: Expr| if required { body } else { body.not() };

            let known = self
                .evaluate(&condition.body)
                .and_then(|value| match value {
                    PartialValue::Value(value) => value.as_bool().map(Some),
                    PartialValue::Residual(residual) => {
                        conjuncts.push(clause(residual));
                        Ok(None)
                    }
                });

            match known {
                Ok(Some(holds)) if holds != required => {
                    return PartialOutcome::Known(PolicyOutcome::NotSatisfied);
                }
                Ok(_) => {}
                Err(err) if conjuncts.is_empty() => {
                    return PartialOutcome::Known(PolicyOutcome::Errored(err));
                }
                Err(_) => conjuncts.push(clause(condition.body.clone())),
            }
        }

        if conjuncts.is_empty() {
            PartialOutcome::Known(PolicyOutcome::Satisfied)
        } else {
            PartialOutcome::Residual(Expr::conjunction(conjuncts))
        }
    }

    /// Simplify a lazily evaluated child, keeping it untouched if it errors.
    fn simplify_or_keep(&self, expr: &Expr, depth: usize) -> Expr {
        match self.partial(expr, depth) {
            Ok(value) => value.into_expr(),
            Err(_) => expr.clone(),
        }
    }

    fn partial(&self, expr: &Expr, depth: usize) -> Result<PartialValue, EvalError> {
        use PartialValue::{Residual, Value as Known};

        if depth > self.limits.max_depth {
            return Err(EvalError::RecursionLimit {
                max: self.limits.max_depth,
            });
        }
        let next = depth + 1;

        let value = match expr {
            Expr::Literal(value) => Known(value.clone()),
            Expr::Var(var) => match self.request.get(*var) {
                Some(value) => Known(value),
                None => Residual(Expr::Var(*var)),
            },
            Expr::GetAttr { expr, attr } => match self.partial(expr, next)? {
                Known(base) => Known(ops::get_attr(&base, attr, self.entities)?),
                Residual(base) => Residual(base.get_attr(attr.clone())),
            },
            Expr::HasAttr { expr, attr } => match self.partial(expr, next)? {
                Known(base) => Known(Value::Bool(ops::has_attr(&base, attr, self.entities)?)),
                Residual(base) => Residual(base.has_attr(attr.clone())),
            },
            Expr::And { left, right } => match self.partial(left, next)? {
                Known(left) => {
                    if !left.as_bool()? {
                        Known(Value::Bool(false))
                    } else {
                        match self.partial(right, next)? {
                            Known(right) => Known(Value::Bool(right.as_bool()?)),
                            Residual(right) => Residual(Expr::boolean(true).and(right)),
                        }
                    }
                }
                Residual(left) => Residual(left.and(self.simplify_or_keep(right, next))),
            },
            Expr::Or { left, right } => match self.partial(left, next)? {
                Known(left) => {
                    if left.as_bool()? {
                        Known(Value::Bool(true))
                    } else {
                        match self.partial(right, next)? {
                            Known(right) => Known(Value::Bool(right.as_bool()?)),
                            Residual(right) => Residual(Expr::boolean(false).or(right)),
                        }
                    }
                }
                Residual(left) => Residual(left.or(self.simplify_or_keep(right, next))),
            },
            Expr::If {
                cond,
                then_expr,
                else_expr,
            } => match self.partial(cond, next)? {
                Known(cond) => {
                    if cond.as_bool()? {
                        self.partial(then_expr, next)?
                    } else {
                        self.partial(else_expr, next)?
                    }
                }
                Residual(cond) => Residual(Expr::ite(
                    cond,
                    self.simplify_or_keep(then_expr, next),
                    self.simplify_or_keep(else_expr, next),
                )),
            },
            Expr::UnaryApp { op, arg } => match self.partial(arg, next)? {
                Known(arg) => Known(ops::apply_unary(*op, &arg)?),
                Residual(arg) => Residual(arg.unary(*op)),
            },
            Expr::BinaryApp { op, left, right } => {
                let left = self.partial(left, next)?;
                let right = self.partial(right, next)?;
                match (left, right) {
                    (Known(left), Known(right)) => {
                        Known(ops::apply_binary(*op, &left, &right, self.entities)?)
                    }
                    (left, right) => Residual(left.into_expr().binary(*op, right.into_expr())),
                }
            }
            Expr::Is { expr, entity_type } => match self.partial(expr, next)? {
                Known(value) => Known(Value::Bool(ops::is_type(&value, entity_type)?)),
                Residual(expr) => Residual(expr.is_type(entity_type.clone())),
            },
            Expr::IsIn {
                expr,
                entity_type,
                parent,
            } => match self.partial(expr, next)? {
                Known(value) => {
                    if !ops::is_type(&value, entity_type)? {
                        Known(Value::Bool(false))
                    } else {
                        match self.partial(parent, next)? {
                            Known(parent) => {
                                Known(Value::Bool(ops::entity_in(&value, &parent, self.entities)?))
                            }
                            Residual(parent) => Residual(
                                Expr::Literal(value).is_type_in(entity_type.clone(), parent),
                            ),
                        }
                    }
                }
                Residual(expr) => Residual(
                    expr.is_type_in(entity_type.clone(), self.simplify_or_keep(parent, next)),
                ),
            },
            Expr::Like { expr, pattern } => match self.partial(expr, next)? {
                Known(value) => Known(Value::Bool(ops::like(&value, pattern)?)),
                Residual(expr) => Residual(expr.like(pattern.clone())),
            },
            Expr::Set(elems) => {
                let elems = elems
                    .iter()
                    .map(|elem| self.partial(elem, next))
                    .collect::<Result<Vec<_>, _>>()?;
                if elems.iter().all(PartialValue::is_known) {
                    Known(Value::set(elems.into_iter().filter_map(PartialValue::into_value)))
                } else {
                    Residual(Expr::set(elems.into_iter().map(PartialValue::into_expr)))
                }
            }
            Expr::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, field)| Ok((name.clone(), self.partial(field, next)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                if fields.iter().all(|(_, field)| field.is_known()) {
                    let record: Record = fields
                        .into_iter()
                        .filter_map(|(name, field)| Some((name, field.into_value()?)))
                        .collect();
                    Known(Value::Record(record))
                } else {
                    Residual(Expr::record(
                        fields
                            .into_iter()
                            .map(|(name, field)| (name, field.into_expr())),
                    ))
                }
            }
            Expr::ExtensionCall { function, args } => {
                let resolved = ExtensionFunction::lookup(function)?;
                let args = args
                    .iter()
                    .map(|arg| self.partial(arg, next))
                    .collect::<Result<Vec<_>, _>>()?;
                if args.iter().all(PartialValue::is_known) {
                    let values: Vec<Value> =
                        args.into_iter().filter_map(PartialValue::into_value).collect();
                    Known(resolved.call(&values)?)
                } else {
                    Residual(Expr::call(
                        function.clone(),
                        args.into_iter().map(PartialValue::into_expr),
                    ))
                }
            }
        };

        Ok(value)
    }
}

/// Partially evaluate `expr` with default limits.
pub fn partial_evaluate<S>(
    expr: &Expr,
    request: &Request,
    entities: &S,
) -> Result<PartialValue, EvalError>
where
    S: EntitySource + ?Sized,
{
    PartialEvaluator::new(request, entities).evaluate(expr)
}
