// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Domain checks built on the [`Chain`](crate::chain::Chain) engine.
//!
//! Each `*_check` function returns one [`Check`](crate::chain::Check) with
//! its message tags and failure outcome; the `*_chain` builders assemble
//! and execute the chains that use them.

pub mod qualification;
pub mod revocation;

pub use qualification::{qualification_at_time_chain, qualification_conflict_check};
pub use revocation::{
    certificate_revocation_chain, requires_revocation_data, revocation_acceptance_chain,
    revocation_data_available_check,
    revocation_issuer_revocation_data_available_check, self_issued_ocsp_check,
};
