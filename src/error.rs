use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{PolicyId, PolicySet, Var};
use crate::types::{EntityUid, Type};

/// A failure while evaluating an expression.
///
/// These are data, never panics: the policy evaluator turns them into an
/// errored policy outcome and the authorizer reports them as diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EvalError {
    #[error("type error: expected {}, got {actual}", .expected.iter().join(" or "))]
    TypeMismatch { expected: Vec<Type>, actual: Type },

    #[error("cannot access attribute `{attr}`: {detail}")]
    AttributeAccess { attr: String, detail: String },

    #[error("entity does not exist: {0}")]
    EntityNotFound(EntityUid),

    #[error("integer overflow: {operation}")]
    IntegerOverflow { operation: String },

    #[error("error in extension function `{function}`: {message}")]
    ExtensionError { function: String, message: String },

    #[error("unbound variable: {0}")]
    UnboundVariable(Var),

    #[error("expression exceeds maximum nesting depth of {max}")]
    RecursionLimit { max: usize },
}

impl EvalError {
    pub(crate) fn type_mismatch(expected: impl Into<Vec<Type>>, actual: Type) -> Self {
        EvalError::TypeMismatch {
            expected: expected.into(),
            actual,
        }
    }

    pub(crate) fn extension(function: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::ExtensionError {
            function: function.into(),
            message: message.into(),
        }
    }

    pub(crate) fn overflow(operation: impl Into<String>) -> Self {
        EvalError::IntegerOverflow {
            operation: operation.into(),
        }
    }
}

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PolicyError {
    #[error("failed to lock policy set for read/write: {0}")]
    LockError(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),

    #[error("duplicate policy id: {0}")]
    DuplicatePolicyId(PolicyId),

    #[error("Entity error: {0}")]
    EntityError(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl From<PoisonError<RwLockReadGuard<'_, PolicySet>>> for PolicyError {
    fn from(err: PoisonError<RwLockReadGuard<'_, PolicySet>>) -> Self {
        PolicyError::PoisonedLockError(err.to_string())
    }
}

impl From<PoisonError<RwLockWriteGuard<'_, PolicySet>>> for PolicyError {
    fn from(err: PoisonError<RwLockWriteGuard<'_, PolicySet>>) -> Self {
        PolicyError::PoisonedLockError(err.to_string())
    }
}
