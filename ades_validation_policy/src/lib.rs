// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Policy-driven chain-of-checks engine.
//!
//! Validation results are produced by executing a [`Chain`] of [`Check`]s.
//! Each check is weighted by a [`LevelConstraint`] taken from the
//! [`ValidationPolicy`]; the chain concludes with an [`Indication`] and, for
//! non-passed results, usually a [`SubIndication`].
//!
//! ```
//! use ades_validation_policy::{Chain, Check, Indication, LevelConstraint, MessageTag};
//!
//! let revocation_data: Vec<String> = Vec::new();
//! let result = Chain::new("Revocation")
//!     .then(Check::new(
//!         MessageTag::BBB_XCV_IRDPFC,
//!         MessageTag::BBB_XCV_IRDPFC_ANS,
//!         LevelConstraint::Fail,
//!         || !revocation_data.is_empty(),
//!     ))
//!     .execute();
//! assert_eq!(result.conclusion().indication(), Indication::Failed);
//! ```

pub mod chain;
pub mod checks;
pub mod conclusion;
pub mod error;
pub mod indication;
pub mod level;
pub mod message;
pub mod policy;
pub mod qualification;
pub mod wrappers;

pub use chain::{Chain, ChainEntry, ChainResult, Check, ConstraintStatus};
pub use conclusion::{Conclusion, FailureIndication, Message};
pub use error::PolicyError;
pub use indication::{Indication, SubIndication};
pub use level::LevelConstraint;
pub use message::MessageTag;
pub use policy::{
    QualificationConstraints, RevocationConstraints, TimestampConstraints, ValidationPolicy,
};
pub use qualification::{CertificateQualification, QualificationPeriod, QualificationTimeline};
pub use wrappers::{CertificateWrapper, RevocationType, RevocationWrapper};
