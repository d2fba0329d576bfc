// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};

use crate::oid;

/// Digest algorithms accepted for message imprints and signer digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl DigestAlgorithm {
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            oid::SHA1 => Some(Self::Sha1),
            oid::SHA224 => Some(Self::Sha224),
            oid::SHA256 => Some(Self::Sha256),
            oid::SHA384 => Some(Self::Sha384),
            oid::SHA512 => Some(Self::Sha512),
            oid::SHA3_256 => Some(Self::Sha3_256),
            oid::SHA3_384 => Some(Self::Sha3_384),
            oid::SHA3_512 => Some(Self::Sha3_512),
            _ => None,
        }
    }

    pub fn oid(&self) -> &'static str {
        match self {
            Self::Sha1 => oid::SHA1,
            Self::Sha224 => oid::SHA224,
            Self::Sha256 => oid::SHA256,
            Self::Sha384 => oid::SHA384,
            Self::Sha512 => oid::SHA512,
            Self::Sha3_256 => oid::SHA3_256,
            Self::Sha3_384 => oid::SHA3_384,
            Self::Sha3_512 => oid::SHA3_512,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha3_256 => Sha3_256::digest(data).to_vec(),
            Self::Sha3_384 => Sha3_384::digest(data).to_vec(),
            Self::Sha3_512 => Sha3_512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Public key families the verifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    Rsa,
    RsaSsaPss,
    Ecdsa,
    Ed25519,
}

impl EncryptionAlgorithm {
    /// Maps a SubjectPublicKeyInfo algorithm OID.
    pub fn from_key_oid(oid: &str) -> Option<Self> {
        match oid {
            oid::RSA_ENCRYPTION => Some(Self::Rsa),
            oid::RSASSA_PSS => Some(Self::RsaSsaPss),
            oid::EC_PUBLIC_KEY => Some(Self::Ecdsa),
            oid::ED25519 => Some(Self::Ed25519),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::RsaSsaPss => "RSASSA-PSS",
            Self::Ecdsa => "ECDSA",
            Self::Ed25519 => "ED25519",
        }
    }

    /// Whether a signature of this family can be produced by a key of `key` type.
    pub fn accepts_key(&self, key: EncryptionAlgorithm) -> bool {
        match self {
            Self::RsaSsaPss => matches!(key, Self::Rsa | Self::RsaSsaPss),
            family => *family == key,
        }
    }
}

/// `RSASSA-PSS-params` of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PssParameters {
    pub digest: DigestAlgorithm,
    /// Hash of the MGF1 mask generation function.
    pub mask_digest: DigestAlgorithm,
    pub salt_len: usize,
}

impl Default for PssParameters {
    /// RFC 4055 defaults: SHA-1, MGF1 with SHA-1 and a 20 byte salt.
    fn default() -> Self {
        Self {
            digest: DigestAlgorithm::Sha1,
            mask_digest: DigestAlgorithm::Sha1,
            salt_len: 20,
        }
    }
}

/// Combined signature algorithm derived once the signer is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    RsaSha1,
    RsaSha224,
    RsaSha256,
    RsaSha384,
    RsaSha512,
    RsaSha3_256,
    RsaSha3_384,
    RsaSha3_512,
    RsaSsaPss(PssParameters),
    EcdsaSha1,
    EcdsaSha224,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
    EcdsaSha3_256,
    EcdsaSha3_384,
    EcdsaSha3_512,
    Ed25519,
}

impl SignatureAlgorithm {
    /// Combines a key family and digest. PSS takes its digest from its parameters.
    pub fn from_parts(encryption: EncryptionAlgorithm, digest: DigestAlgorithm) -> Self {
        use DigestAlgorithm as D;
        match (encryption, digest) {
            (EncryptionAlgorithm::Rsa, D::Sha1) => Self::RsaSha1,
            (EncryptionAlgorithm::Rsa, D::Sha224) => Self::RsaSha224,
            (EncryptionAlgorithm::Rsa, D::Sha256) => Self::RsaSha256,
            (EncryptionAlgorithm::Rsa, D::Sha384) => Self::RsaSha384,
            (EncryptionAlgorithm::Rsa, D::Sha512) => Self::RsaSha512,
            (EncryptionAlgorithm::Rsa, D::Sha3_256) => Self::RsaSha3_256,
            (EncryptionAlgorithm::Rsa, D::Sha3_384) => Self::RsaSha3_384,
            (EncryptionAlgorithm::Rsa, D::Sha3_512) => Self::RsaSha3_512,
            (EncryptionAlgorithm::RsaSsaPss, digest) => Self::RsaSsaPss(PssParameters {
                digest,
                mask_digest: digest,
                salt_len: digest.output_len(),
            }),
            (EncryptionAlgorithm::Ecdsa, D::Sha1) => Self::EcdsaSha1,
            (EncryptionAlgorithm::Ecdsa, D::Sha224) => Self::EcdsaSha224,
            (EncryptionAlgorithm::Ecdsa, D::Sha256) => Self::EcdsaSha256,
            (EncryptionAlgorithm::Ecdsa, D::Sha384) => Self::EcdsaSha384,
            (EncryptionAlgorithm::Ecdsa, D::Sha512) => Self::EcdsaSha512,
            (EncryptionAlgorithm::Ecdsa, D::Sha3_256) => Self::EcdsaSha3_256,
            (EncryptionAlgorithm::Ecdsa, D::Sha3_384) => Self::EcdsaSha3_384,
            (EncryptionAlgorithm::Ecdsa, D::Sha3_512) => Self::EcdsaSha3_512,
            (EncryptionAlgorithm::Ed25519, _) => Self::Ed25519,
        }
    }

    /// Resolves the algorithm of a `SignerInfo` against the signer's key type.
    ///
    /// `signature_oid` may name a full algorithm (`sha256WithRSAEncryption`,
    /// `ecdsa-with-SHA384`, `id-RSASSA-PSS` with its `pss` parameters) or only
    /// the key family, in which case the `SignerInfo` digest algorithm
    /// completes it. Returns `None` when the OID contradicts the key type.
    pub fn resolve(
        signature_oid: &str,
        digest: DigestAlgorithm,
        pss: Option<PssParameters>,
        key: EncryptionAlgorithm,
    ) -> Option<Self> {
        let resolved = match signature_oid {
            oid::RSA_ENCRYPTION | oid::EC_PUBLIC_KEY => {
                let family = EncryptionAlgorithm::from_key_oid(signature_oid)?;
                Self::from_parts(family, digest)
            }
            oid::RSASSA_PSS => Self::RsaSsaPss(pss.unwrap_or_default()),
            oid::SHA1_WITH_RSA => Self::RsaSha1,
            oid::SHA224_WITH_RSA => Self::RsaSha224,
            oid::SHA256_WITH_RSA => Self::RsaSha256,
            oid::SHA384_WITH_RSA => Self::RsaSha384,
            oid::SHA512_WITH_RSA => Self::RsaSha512,
            oid::SHA3_256_WITH_RSA => Self::RsaSha3_256,
            oid::SHA3_384_WITH_RSA => Self::RsaSha3_384,
            oid::SHA3_512_WITH_RSA => Self::RsaSha3_512,
            oid::ECDSA_WITH_SHA1 => Self::EcdsaSha1,
            oid::ECDSA_WITH_SHA224 => Self::EcdsaSha224,
            oid::ECDSA_WITH_SHA256 => Self::EcdsaSha256,
            oid::ECDSA_WITH_SHA384 => Self::EcdsaSha384,
            oid::ECDSA_WITH_SHA512 => Self::EcdsaSha512,
            oid::ECDSA_WITH_SHA3_256 => Self::EcdsaSha3_256,
            oid::ECDSA_WITH_SHA3_384 => Self::EcdsaSha3_384,
            oid::ECDSA_WITH_SHA3_512 => Self::EcdsaSha3_512,
            oid::ED25519 => Self::Ed25519,
            _ => return None,
        };
        resolved
            .encryption_algorithm()
            .accepts_key(key)
            .then_some(resolved)
    }

    pub fn encryption_algorithm(&self) -> EncryptionAlgorithm {
        match self {
            Self::RsaSha1
            | Self::RsaSha224
            | Self::RsaSha256
            | Self::RsaSha384
            | Self::RsaSha512
            | Self::RsaSha3_256
            | Self::RsaSha3_384
            | Self::RsaSha3_512 => EncryptionAlgorithm::Rsa,
            Self::RsaSsaPss(_) => EncryptionAlgorithm::RsaSsaPss,
            Self::EcdsaSha1
            | Self::EcdsaSha224
            | Self::EcdsaSha256
            | Self::EcdsaSha384
            | Self::EcdsaSha512
            | Self::EcdsaSha3_256
            | Self::EcdsaSha3_384
            | Self::EcdsaSha3_512 => EncryptionAlgorithm::Ecdsa,
            Self::Ed25519 => EncryptionAlgorithm::Ed25519,
        }
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::RsaSha1 | Self::EcdsaSha1 => DigestAlgorithm::Sha1,
            Self::RsaSha224 | Self::EcdsaSha224 => DigestAlgorithm::Sha224,
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 | Self::Ed25519 => DigestAlgorithm::Sha512,
            Self::RsaSha3_256 | Self::EcdsaSha3_256 => DigestAlgorithm::Sha3_256,
            Self::RsaSha3_384 | Self::EcdsaSha3_384 => DigestAlgorithm::Sha3_384,
            Self::RsaSha3_512 | Self::EcdsaSha3_512 => DigestAlgorithm::Sha3_512,
            Self::RsaSsaPss(params) => params.digest,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => f.write_str("ED25519"),
            other => write!(
                f,
                "{}_{}",
                other.encryption_algorithm().name(),
                other.digest_algorithm().name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_encryption_oid_takes_the_signer_digest() {
        let alg = SignatureAlgorithm::resolve(
            oid::RSA_ENCRYPTION,
            DigestAlgorithm::Sha512,
            None,
            EncryptionAlgorithm::Rsa,
        );
        assert_eq!(alg, Some(SignatureAlgorithm::RsaSha512));
    }

    #[test]
    fn mismatched_key_family_is_rejected() {
        let alg = SignatureAlgorithm::resolve(
            oid::ECDSA_WITH_SHA256,
            DigestAlgorithm::Sha256,
            None,
            EncryptionAlgorithm::Rsa,
        );
        assert_eq!(alg, None);
    }

    #[test]
    fn pss_uses_its_parameters_and_an_rsa_key() {
        let params = PssParameters {
            digest: DigestAlgorithm::Sha384,
            mask_digest: DigestAlgorithm::Sha384,
            salt_len: 48,
        };
        let alg = SignatureAlgorithm::resolve(
            oid::RSASSA_PSS,
            DigestAlgorithm::Sha256,
            Some(params),
            EncryptionAlgorithm::Rsa,
        );
        assert_eq!(alg, Some(SignatureAlgorithm::RsaSsaPss(params)));
        assert_eq!(alg.map(|a| a.digest_algorithm()), Some(DigestAlgorithm::Sha384));

        let on_ec_key = SignatureAlgorithm::resolve(
            oid::RSASSA_PSS,
            DigestAlgorithm::Sha256,
            Some(params),
            EncryptionAlgorithm::Ecdsa,
        );
        assert_eq!(on_ec_key, None);
    }

    #[test]
    fn sha3_digests() {
        assert_eq!(DigestAlgorithm::from_oid("2.16.840.1.101.3.4.2.8"), Some(DigestAlgorithm::Sha3_256));
        assert_eq!(DigestAlgorithm::Sha3_512.digest(b"abc").len(), 64);
        // FIPS 202 test vector for SHA3-256("abc").
        assert_eq!(
            hex::encode(DigestAlgorithm::Sha3_256.digest(b"abc")),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn display_uses_family_and_digest() {
        assert_eq!(SignatureAlgorithm::RsaSha256.to_string(), "RSA_SHA256");
        assert_eq!(SignatureAlgorithm::Ed25519.to_string(), "ED25519");
        assert_eq!(SignatureAlgorithm::EcdsaSha3_256.to_string(), "ECDSA_SHA3-256");
        assert_eq!(
            SignatureAlgorithm::from_parts(EncryptionAlgorithm::RsaSsaPss, DigestAlgorithm::Sha256)
                .to_string(),
            "RSASSA-PSS_SHA256"
        );
    }
}
