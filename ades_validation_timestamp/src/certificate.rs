// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoded X.509 certificate with the fields signer resolution needs.

use std::fmt;

use chrono::{DateTime, Utc};
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use rsa::pkcs1::DecodeRsaPublicKey as _;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};
use signature::hazmat::PrehashVerifier as _;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::{FromDer, X509Certificate, X509Name};

use crate::algorithms::{DigestAlgorithm, EncryptionAlgorithm, SignatureAlgorithm};
use crate::ber::strip_leading_zeros;
use crate::error::CertificateError;
use crate::ids::TokenId;

/// Immutable certificate token keyed by the SHA-256 of its encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateToken {
    id: TokenId,
    encoded: Vec<u8>,
    subject: String,
    issuer: String,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    serial_number: Vec<u8>,
    subject_key_identifier: Option<Vec<u8>>,
    public_key_info: Vec<u8>,
    public_key_bits: Vec<u8>,
    key_algorithm: Option<EncryptionAlgorithm>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl CertificateToken {
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::Decode(e.to_string()))?;

        let subject_key_identifier = cert.extensions().iter().find_map(|ext| {
            match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(ki) => Some(ki.0.to_vec()),
                _ => None,
            }
        });

        let validity = cert.validity();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or(CertificateError::InvalidValidity)?;
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or(CertificateError::InvalidValidity)?;

        let spki = cert.public_key();
        let key_algorithm = EncryptionAlgorithm::from_key_oid(&spki.algorithm.algorithm.to_id_string());

        Ok(Self {
            id: TokenId::of(der),
            encoded: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            subject_raw: cert.subject().as_raw().to_vec(),
            issuer_raw: cert.issuer().as_raw().to_vec(),
            serial_number: strip_leading_zeros(cert.tbs_certificate.raw_serial()).to_vec(),
            subject_key_identifier,
            public_key_info: spki.raw.to_vec(),
            public_key_bits: spki.subject_public_key.data.to_vec(),
            key_algorithm,
            not_before,
            not_after,
        })
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Identifier in the `C-<sha256>` form used by diagnostic data.
    pub fn dss_id(&self) -> String {
        format!("C-{}", self.id.to_hex())
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// DER encoding of the issuer `Name`.
    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    /// DER encoding of the subject `Name`.
    pub fn subject_raw(&self) -> &[u8] {
        &self.subject_raw
    }

    /// Serial number content octets without redundant leading zeros.
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_identifier.as_deref()
    }

    pub fn public_key_info(&self) -> &[u8] {
        &self.public_key_info
    }

    pub fn key_algorithm(&self) -> Option<EncryptionAlgorithm> {
        self.key_algorithm
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    /// Issuer and subject are the same distinguished name.
    pub fn is_self_signed(&self) -> bool {
        names_equal(&self.issuer_raw, &self.subject_raw)
    }

    pub fn digest(&self, algorithm: DigestAlgorithm) -> Vec<u8> {
        algorithm.digest(&self.encoded)
    }

    /// Matches an `IssuerAndSerialNumber` (issuer as an encoded `Name`).
    pub fn matches_issuer_serial(&self, issuer: &[u8], serial: &[u8]) -> bool {
        strip_leading_zeros(serial) == self.serial_number.as_slice()
            && names_equal(issuer, &self.issuer_raw)
    }

    /// Verifies `signature` over `message` with this certificate's public key.
    pub fn verify_signature(
        &self,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), String> {
        match algorithm.encryption_algorithm() {
            EncryptionAlgorithm::Rsa | EncryptionAlgorithm::RsaSsaPss => {
                // `id-RSASSA-PSS` keys carry a PKCS#1 key under a different SPKI algorithm.
                let key = RsaPublicKey::from_public_key_der(&self.public_key_info)
                    .ok()
                    .or_else(|| RsaPublicKey::from_pkcs1_der(&self.public_key_bits).ok())
                    .ok_or_else(|| "bad RSA public key".to_string())?;
                let hashed = algorithm.digest_algorithm().digest(message);
                let verified = match algorithm {
                    SignatureAlgorithm::RsaSsaPss(params) => {
                        if params.mask_digest != params.digest {
                            return Err(format!(
                                "MGF1 with {} under a {} digest is not supported",
                                params.mask_digest, params.digest
                            ));
                        }
                        key.verify(pss_scheme(params.digest, params.salt_len), &hashed, signature)
                    }
                    _ => key.verify(pkcs1v15_scheme(algorithm.digest_algorithm()), &hashed, signature),
                };
                verified.map_err(|_| "signature verification failed".to_string())
            }
            EncryptionAlgorithm::Ecdsa => {
                let prehash = algorithm.digest_algorithm().digest(message);
                if let Ok(pk) = p256::PublicKey::from_public_key_der(&self.public_key_info) {
                    let ep = pk.to_encoded_point(false);
                    let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                        .map_err(|e| format!("bad P-256 public key: {e}"))?;
                    let sig = p256::ecdsa::Signature::from_der(signature)
                        .map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
                    return vk
                        .verify_prehash(&prehash, &sig)
                        .map_err(|_| "signature verification failed".to_string());
                }
                if let Ok(pk) = p384::PublicKey::from_public_key_der(&self.public_key_info) {
                    let ep = pk.to_encoded_point(false);
                    let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                        .map_err(|e| format!("bad P-384 public key: {e}"))?;
                    let sig = p384::ecdsa::Signature::from_der(signature)
                        .map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
                    return vk
                        .verify_prehash(&prehash, &sig)
                        .map_err(|_| "signature verification failed".to_string());
                }
                Err("unsupported EC curve".to_string())
            }
            EncryptionAlgorithm::Ed25519 => {
                let bytes: [u8; 32] = self
                    .public_key_bits
                    .as_slice()
                    .try_into()
                    .map_err(|_| "bad Ed25519 public key length".to_string())?;
                let vk = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| format!("bad Ed25519 public key: {e}"))?;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| format!("bad Ed25519 signature bytes: {e}"))?;
                vk.verify_strict(message, &sig)
                    .map_err(|_| "signature verification failed".to_string())
            }
        }
    }
}

impl fmt::Debug for CertificateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateToken")
            .field("id", &self.dss_id())
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .finish()
    }
}

fn pkcs1v15_scheme(digest: DigestAlgorithm) -> Pkcs1v15Sign {
    match digest {
        DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        DigestAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        DigestAlgorithm::Sha3_256 => Pkcs1v15Sign::new::<Sha3_256>(),
        DigestAlgorithm::Sha3_384 => Pkcs1v15Sign::new::<Sha3_384>(),
        DigestAlgorithm::Sha3_512 => Pkcs1v15Sign::new::<Sha3_512>(),
    }
}

fn pss_scheme(digest: DigestAlgorithm, salt_len: usize) -> Pss {
    match digest {
        DigestAlgorithm::Sha1 => Pss::new_with_salt::<Sha1>(salt_len),
        DigestAlgorithm::Sha224 => Pss::new_with_salt::<Sha224>(salt_len),
        DigestAlgorithm::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
        DigestAlgorithm::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
        DigestAlgorithm::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        DigestAlgorithm::Sha3_256 => Pss::new_with_salt::<Sha3_256>(salt_len),
        DigestAlgorithm::Sha3_384 => Pss::new_with_salt::<Sha3_384>(salt_len),
        DigestAlgorithm::Sha3_512 => Pss::new_with_salt::<Sha3_512>(salt_len),
    }
}

/// Compares two encoded names, falling back to the decoded form when the
/// encodings differ (BER producers do not always re-encode names canonically).
pub(crate) fn names_equal(a: &[u8], b: &[u8]) -> bool {
    if a == b {
        return true;
    }
    match (X509Name::from_der(a), X509Name::from_der(b)) {
        (Ok((_, a)), Ok((_, b))) => a.to_string() == b.to_string(),
        _ => false,
    }
}
