//! Evaluation limits.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Bounds applied to every evaluation.
///
/// Deserializes with defaults for missing fields, so it can be embedded in a
/// host's own configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationLimits {
    /// Maximum expression nesting depth before `RecursionLimit` is reported.
    pub max_depth: usize,
}

impl Default for EvaluationLimits {
    fn default() -> Self {
        EvaluationLimits {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvaluationLimits {
    pub fn with_max_depth(max_depth: usize) -> Self {
        EvaluationLimits { max_depth }
    }
}
