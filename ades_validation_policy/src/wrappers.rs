// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-only views of diagnostic data consumed by the checks.
//!
//! The diagnostic layer (path building, trusted lists, revocation fetching)
//! lives outside this crate and hands already-resolved objects over through
//! these traits.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevocationType {
    Crl,
    Ocsp,
}

impl fmt::Display for RevocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Crl => "CRL",
            Self::Ocsp => "OCSP",
        })
    }
}

pub trait CertificateWrapper: Send + Sync {
    /// Stable identifier, e.g. `C-<hex digest>`.
    fn id(&self) -> &str;

    fn is_self_signed(&self) -> bool;

    fn is_trusted(&self) -> bool;

    /// The certificate carries the `id-pkix-ocsp-nocheck` extension.
    fn is_id_pkix_ocsp_no_check(&self) -> bool;

    /// Identifiers of the issuer chain, closest issuer first.
    fn certificate_chain_ids(&self) -> &[String];

    /// Revocation data found for this certificate.
    fn revocation_data(&self) -> &[Arc<dyn RevocationWrapper>];

    fn is_in_certificate_chain(&self, certificate_id: &str) -> bool {
        self.certificate_chain_ids()
            .iter()
            .any(|id| id == certificate_id)
    }
}

pub trait RevocationWrapper: Send + Sync {
    fn id(&self) -> &str;

    fn revocation_type(&self) -> RevocationType;

    /// Identifiers of the chain that signed the revocation data, signer first.
    fn certificate_chain_ids(&self) -> &[String];

    fn signing_certificate(&self) -> Option<Arc<dyn CertificateWrapper>>;

    fn is_in_certificate_chain(&self, certificate_id: &str) -> bool {
        self.certificate_chain_ids()
            .iter()
            .any(|id| id == certificate_id)
    }
}
