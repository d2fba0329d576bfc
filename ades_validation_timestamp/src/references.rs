// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate references carried in signed and unsigned attributes.

use subtle::ConstantTimeEq;

use crate::algorithms::DigestAlgorithm;
use crate::ber::{parse_single, strip_leading_zeros, BerError};
use crate::certificate::{names_equal, CertificateToken};

/// Attribute a certificate reference was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateRefOrigin {
    /// `signingCertificate` (ESSCertID, SHA-1 digests).
    SigningCertificate,
    /// `signingCertificateV2` (ESSCertIDv2).
    SigningCertificateV2,
    /// `complete-certificate-refs` (OtherCertID).
    CompleteCertificateRefs,
}

impl CertificateRefOrigin {
    pub fn is_signing_certificate(&self) -> bool {
        matches!(self, Self::SigningCertificate | Self::SigningCertificateV2)
    }
}

/// `IssuerSerial` with the issuer kept as encoded `GeneralNames`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerSerial {
    pub issuer: Vec<u8>,
    pub serial_number: Vec<u8>,
}

impl IssuerSerial {
    /// True when a `directoryName` of the issuer names and the serial match `certificate`.
    pub fn matches(&self, certificate: &CertificateToken) -> bool {
        if strip_leading_zeros(&self.serial_number) != certificate.serial_number() {
            return false;
        }
        match directory_names(&self.issuer) {
            Ok(names) => names
                .iter()
                .any(|name| names_equal(name, certificate.issuer_raw())),
            Err(_) => false,
        }
    }
}

fn directory_names(general_names: &[u8]) -> Result<Vec<&[u8]>, BerError> {
    let seq = parse_single(general_names, "GeneralNames")?;
    let mut out = Vec::new();
    for name in seq.children()? {
        // directoryName [4] EXPLICIT Name
        if name.is_context(4) {
            if let Some(inner) = name.children()?.first() {
                out.push(inner.raw());
            }
        }
    }
    Ok(out)
}

/// Digest reference to a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRef {
    pub origin: CertificateRefOrigin,
    pub digest_algorithm: DigestAlgorithm,
    pub digest: Vec<u8>,
    pub issuer_serial: Option<IssuerSerial>,
}

impl CertificateRef {
    /// Digest of `certificate` equals the referenced digest.
    pub fn matches_digest(&self, certificate: &CertificateToken) -> bool {
        let computed = certificate.digest(self.digest_algorithm);
        bool::from(computed.as_slice().ct_eq(self.digest.as_slice()))
    }

    /// Issuer-serial matches, or is absent.
    pub fn matches_issuer_serial(&self, certificate: &CertificateToken) -> bool {
        self.issuer_serial
            .as_ref()
            .map_or(true, |is| is.matches(certificate))
    }
}
