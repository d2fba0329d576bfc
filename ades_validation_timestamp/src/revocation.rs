// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! CRL and OCSP material embedded in (or referenced by) a timestamp token.
//!
//! Identifiers hold the binary values; references hold only digests and
//! descriptive fields pointing at values stored elsewhere.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::algorithms::DigestAlgorithm;
use crate::ids::TokenId;

/// Binary revocation value (CRL or OCSP response) keyed by its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationIdentifier {
    id: TokenId,
    encoded: Vec<u8>,
}

impl RevocationIdentifier {
    pub fn new(encoded: Vec<u8>) -> Self {
        Self {
            id: TokenId::of(&encoded),
            encoded,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn digest(&self, algorithm: DigestAlgorithm) -> Vec<u8> {
        algorithm.digest(&self.encoded)
    }
}

pub type CrlIdentifier = RevocationIdentifier;
pub type OcspIdentifier = RevocationIdentifier;

/// `CrlValidatedID` from `complete-revocation-refs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlRef {
    pub digest_algorithm: DigestAlgorithm,
    pub digest: Vec<u8>,
    /// Encoded issuer `Name`.
    pub issuer: Option<Vec<u8>>,
    pub issued_time: Option<DateTime<Utc>>,
    pub crl_number: Option<Vec<u8>>,
}

impl CrlRef {
    pub fn matches(&self, identifier: &CrlIdentifier) -> bool {
        digest_matches(self.digest_algorithm, &self.digest, identifier)
    }
}

/// `ResponderID` of an OCSP reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderId {
    /// Encoded responder `Name`.
    ByName(Vec<u8>),
    /// SHA-1 of the responder public key.
    ByKey(Vec<u8>),
}

/// `OcspResponsesID` from `complete-revocation-refs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRef {
    pub responder_id: ResponderId,
    pub produced_at: DateTime<Utc>,
    pub digest: Option<(DigestAlgorithm, Vec<u8>)>,
}

impl OcspRef {
    /// A reference without a digest matches nothing.
    pub fn matches(&self, identifier: &OcspIdentifier) -> bool {
        self.digest
            .as_ref()
            .is_some_and(|(alg, digest)| digest_matches(*alg, digest, identifier))
    }
}

fn digest_matches(algorithm: DigestAlgorithm, expected: &[u8], identifier: &RevocationIdentifier) -> bool {
    let computed = identifier.digest(algorithm);
    bool::from(computed.as_slice().ct_eq(expected))
}

/// CRLs embedded in and referenced by a timestamp token.
#[derive(Debug, Clone, Default)]
pub struct TimestampCrlSource {
    identifiers: Vec<CrlIdentifier>,
    references: Vec<CrlRef>,
}

impl TimestampCrlSource {
    pub(crate) fn add_identifier(&mut self, encoded: Vec<u8>) {
        add_unique(&mut self.identifiers, encoded);
    }

    pub(crate) fn add_reference(&mut self, reference: CrlRef) {
        self.references.push(reference);
    }

    pub fn identifiers(&self) -> &[CrlIdentifier] {
        &self.identifiers
    }

    pub fn references(&self) -> &[CrlRef] {
        &self.references
    }

    /// References whose digest matches none of the embedded values.
    pub fn orphan_references(&self) -> Vec<&CrlRef> {
        self.references
            .iter()
            .filter(|r| !self.identifiers.iter().any(|i| r.matches(i)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty() && self.references.is_empty()
    }
}

/// OCSP responses embedded in and referenced by a timestamp token.
#[derive(Debug, Clone, Default)]
pub struct TimestampOcspSource {
    identifiers: Vec<OcspIdentifier>,
    references: Vec<OcspRef>,
}

impl TimestampOcspSource {
    pub(crate) fn add_identifier(&mut self, encoded: Vec<u8>) {
        add_unique(&mut self.identifiers, encoded);
    }

    pub(crate) fn add_reference(&mut self, reference: OcspRef) {
        self.references.push(reference);
    }

    pub fn identifiers(&self) -> &[OcspIdentifier] {
        &self.identifiers
    }

    pub fn references(&self) -> &[OcspRef] {
        &self.references
    }

    pub fn orphan_references(&self) -> Vec<&OcspRef> {
        self.references
            .iter()
            .filter(|r| !self.identifiers.iter().any(|i| r.matches(i)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty() && self.references.is_empty()
    }
}

fn add_unique(identifiers: &mut Vec<RevocationIdentifier>, encoded: Vec<u8>) {
    let candidate = RevocationIdentifier::new(encoded);
    if !identifiers.iter().any(|i| i.id() == candidate.id()) {
        identifiers.push(candidate);
    }
}
