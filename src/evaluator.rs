//! The expression interpreter.
//!
//! Evaluation is a single recursive `match` over [`Expr`]. Children are
//! evaluated left to right; `&&`, `||`, `if` and `is ... in` are the only
//! nodes that skip a child.

pub(crate) mod ops;


use crate::ast::Expr;
use crate::config::EvaluationLimits;
use crate::error::EvalError;
use crate::extensions::ExtensionFunction;
use crate::traits::EntitySource;
use crate::types::{Record, Request, Value};

/// Evaluates expressions against one request and one entity store.
///
/// Holds only borrows and keeps no state between calls.
pub struct Evaluator<'e, S: EntitySource + ?Sized> {
    request: &'e Request,
    entities: &'e S,
    limits: EvaluationLimits,
}

impl<'e, S: EntitySource + ?Sized> Evaluator<'e, S> {
    pub fn new(request: &'e Request, entities: &'e S) -> Self {
        Evaluator {
            request,
            entities,
            limits: EvaluationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EvaluationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        self.interpret(expr, 0)
    }

    /// Evaluate and require a Boolean result.
    pub fn evaluate_bool(&self, expr: &Expr) -> Result<bool, EvalError> {
        self.evaluate(expr)?.as_bool()
    }

    fn interpret(&self, expr: &Expr, depth: usize) -> Result<Value, EvalError> {
        if depth > self.limits.max_depth {
            return Err(EvalError::RecursionLimit {
                max: self.limits.max_depth,
            });
        }
        let next = depth + 1;

        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(var) => self.request.lookup(*var),
            Expr::GetAttr { expr, attr } => {
                let base = self.interpret(expr, next)?;
                ops::get_attr(&base, attr, self.entities)
            }
            Expr::HasAttr { expr, attr } => {
                let base = self.interpret(expr, next)?;
                ops::has_attr(&base, attr, self.entities).map(Value::Bool)
            }
            Expr::And { left, right } => {
                if !self.interpret(left, next)?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
                self.interpret(right, next)?.as_bool().map(Value::Bool)
            }
            Expr::Or { left, right } => {
                if self.interpret(left, next)?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
                self.interpret(right, next)?.as_bool().map(Value::Bool)
            }
            Expr::If {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.interpret(cond, next)?.as_bool()? {
                    self.interpret(then_expr, next)
                } else {
                    self.interpret(else_expr, next)
                }
            }
            Expr::UnaryApp { op, arg } => {
                let arg = self.interpret(arg, next)?;
                ops::apply_unary(*op, &arg)
            }
            Expr::BinaryApp { op, left, right } => {
                let left = self.interpret(left, next)?;
                let right = self.interpret(right, next)?;
                ops::apply_binary(*op, &left, &right, self.entities)
            }
            Expr::Is { expr, entity_type } => {
                let value = self.interpret(expr, next)?;
                ops::is_type(&value, entity_type).map(Value::Bool)
            }
            Expr::IsIn {
                expr,
                entity_type,
                parent,
            } => {
                let value = self.interpret(expr, next)?;
                if !ops::is_type(&value, entity_type)? {
                    return Ok(Value::Bool(false));
                }
                let parent = self.interpret(parent, next)?;
                ops::entity_in(&value, &parent, self.entities).map(Value::Bool)
            }
            Expr::Like { expr, pattern } => {
                let value = self.interpret(expr, next)?;
                ops::like(&value, pattern).map(Value::Bool)
            }
            Expr::Set(elems) => {
                let values = elems
                    .iter()
                    .map(|elem| self.interpret(elem, next))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::set(values))
            }
            Expr::Record(fields) => {
                let mut record = Record::new();
                for (name, field) in fields {
                    record.insert(name.clone(), self.interpret(field, next)?);
                }
                Ok(Value::Record(record))
            }
            Expr::ExtensionCall { function, args } => {
                let function = ExtensionFunction::lookup(function)?;
                let args = args
                    .iter()
                    .map(|arg| self.interpret(arg, next))
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(&args)
            }
        }
    }
}

/// Evaluate `expr` with default limits.
pub fn evaluate<S>(expr: &Expr, request: &Request, entities: &S) -> Result<Value, EvalError>
where
    S: EntitySource + ?Sized,
{
    Evaluator::new(request, entities).evaluate(expr)
}
