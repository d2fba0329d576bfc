// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Validation policy: the level constraint applied to each check.
//!
//! Policies are plain data and can be loaded from JSON. Every field has a
//! default, so a document only needs to name the constraints it changes:
//!
//! ```
//! use ades_validation_policy::{LevelConstraint, ValidationPolicy};
//!
//! let policy = ValidationPolicy::from_json_str(
//!     r#"{ "revocation": { "self_issued_ocsp": "FAIL" } }"#,
//! ).unwrap();
//! assert_eq!(policy.revocation.self_issued_ocsp, LevelConstraint::Fail);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::level::LevelConstraint;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ValidationPolicy {
    pub revocation: RevocationConstraints,
    pub timestamp: TimestampConstraints,
    pub qualification: QualificationConstraints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct RevocationConstraints {
    pub revocation_data_available: LevelConstraint,
    pub revocation_issuer_revocation_data_available: LevelConstraint,
    pub self_issued_ocsp: LevelConstraint,
}

impl Default for RevocationConstraints {
    fn default() -> Self {
        Self {
            revocation_data_available: LevelConstraint::Fail,
            revocation_issuer_revocation_data_available: LevelConstraint::Fail,
            self_issued_ocsp: LevelConstraint::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct TimestampConstraints {
    pub message_imprint_data_found: LevelConstraint,
    pub message_imprint_data_intact: LevelConstraint,
    pub signature_intact: LevelConstraint,
    pub signing_certificate_identified: LevelConstraint,
    pub signing_certificate_digest_matches: LevelConstraint,
}

impl Default for TimestampConstraints {
    fn default() -> Self {
        Self {
            message_imprint_data_found: LevelConstraint::Fail,
            message_imprint_data_intact: LevelConstraint::Fail,
            signature_intact: LevelConstraint::Fail,
            signing_certificate_identified: LevelConstraint::Fail,
            signing_certificate_digest_matches: LevelConstraint::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct QualificationConstraints {
    pub qualification_conflict: LevelConstraint,
}

impl Default for QualificationConstraints {
    fn default() -> Self {
        Self {
            qualification_conflict: LevelConstraint::Fail,
        }
    }
}

impl ValidationPolicy {
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(json: &[u8]) -> Result<Self, PolicyError> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
