// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

/// How a failed check affects the enclosing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelConstraint {
    /// Not evaluated, nothing recorded.
    Ignore,
    /// Failure recorded as information.
    Inform,
    /// Failure recorded as a warning.
    Warn,
    /// Failure terminates the chain.
    Fail,
}

impl LevelConstraint {
    pub fn is_evaluated(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}
