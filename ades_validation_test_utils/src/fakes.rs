// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory implementations of the diagnostic wrapper traits.

use std::sync::Arc;

use ades_validation_policy::{CertificateWrapper, RevocationType, RevocationWrapper};

#[derive(Clone, Default)]
pub struct FakeCertificate {
    pub id: String,
    pub self_signed: bool,
    pub trusted: bool,
    pub ocsp_no_check: bool,
    pub chain_ids: Vec<String>,
    pub revocations: Vec<Arc<dyn RevocationWrapper>>,
}

impl FakeCertificate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn self_signed(mut self) -> Self {
        self.self_signed = true;
        self
    }

    pub fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    pub fn ocsp_no_check(mut self) -> Self {
        self.ocsp_no_check = true;
        self
    }

    pub fn with_chain(mut self, ids: &[&str]) -> Self {
        self.chain_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_revocation(mut self, revocation: Arc<dyn RevocationWrapper>) -> Self {
        self.revocations.push(revocation);
        self
    }
}

impl CertificateWrapper for FakeCertificate {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_self_signed(&self) -> bool {
        self.self_signed
    }

    fn is_trusted(&self) -> bool {
        self.trusted
    }

    fn is_id_pkix_ocsp_no_check(&self) -> bool {
        self.ocsp_no_check
    }

    fn certificate_chain_ids(&self) -> &[String] {
        &self.chain_ids
    }

    fn revocation_data(&self) -> &[Arc<dyn RevocationWrapper>] {
        &self.revocations
    }
}

#[derive(Clone)]
pub struct FakeRevocation {
    pub id: String,
    pub revocation_type: RevocationType,
    pub chain_ids: Vec<String>,
    pub signing_certificate: Option<Arc<dyn CertificateWrapper>>,
}

impl FakeRevocation {
    pub fn ocsp(id: impl Into<String>) -> Self {
        Self::new(id, RevocationType::Ocsp)
    }

    pub fn crl(id: impl Into<String>) -> Self {
        Self::new(id, RevocationType::Crl)
    }

    fn new(id: impl Into<String>, revocation_type: RevocationType) -> Self {
        Self {
            id: id.into(),
            revocation_type,
            chain_ids: Vec::new(),
            signing_certificate: None,
        }
    }

    pub fn with_chain(mut self, ids: &[&str]) -> Self {
        self.chain_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn signed_by(mut self, certificate: Arc<dyn CertificateWrapper>) -> Self {
        self.signing_certificate = Some(certificate);
        self
    }
}

impl RevocationWrapper for FakeRevocation {
    fn id(&self) -> &str {
        &self.id
    }

    fn revocation_type(&self) -> RevocationType {
        self.revocation_type
    }

    fn certificate_chain_ids(&self) -> &[String] {
        &self.chain_ids
    }

    fn signing_certificate(&self) -> Option<Arc<dyn CertificateWrapper>> {
        self.signing_certificate.clone()
    }
}
