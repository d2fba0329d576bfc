// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! AdES validation session entrypoint.
//!
//! Ties together:
//! - timestamp token decoding and signer resolution (`ades_validation_timestamp`)
//! - policy-driven check chains (`ades_validation_policy`)
//!
//! A [`ValidationContext`] collects the tokens of one session, verifies each
//! of them once and exposes the processed tokens for the building blocks.

pub mod context;
pub mod error;
pub mod timestamp_block;

pub use context::{ValidationContext, ValidationContextOptions, ValidationSummary};
pub use error::ValidationError;
pub use timestamp_block::timestamp_block;

pub use ades_validation_policy as policy;
pub use ades_validation_timestamp as timestamp;
