// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! RFC 3161 timestamp tokens for AdES validation.
//!
//! This crate decodes timestamp tokens from untrusted bytes (BER or DER),
//! resolves and verifies their signer against a shared [`CertificatePool`],
//! matches their message imprint against the timestamped data and exposes the
//! trust material they embed (certificates, CRL and OCSP values and
//! references).
//!
//! ```no_run
//! use std::sync::Arc;
//! use ades_validation_timestamp::{CertificatePool, TimestampToken, TimestampType};
//!
//! # fn demo(bytes: &[u8], data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Arc::new(CertificatePool::new());
//! let token = TimestampToken::parse(bytes, TimestampType::SignatureTimestamp, &pool)?;
//! let trusted = token.is_signature_valid() && token.match_data(data);
//! # let _ = trusted;
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod ber;
pub mod certificate;
mod cms;
pub mod error;
pub mod ids;
pub mod oid;
pub mod pool;
pub mod references;
pub mod revocation;
pub mod timestamp_type;
pub mod token;

pub use algorithms::{DigestAlgorithm, EncryptionAlgorithm, PssParameters, SignatureAlgorithm};
pub use certificate::CertificateToken;
pub use cms::{Accuracy, MessageImprint, SignerIdentifier, TstInfo};
pub use error::{CertificateError, TimestampParseError};
pub use ids::TokenId;
pub use pool::{CertificatePool, CertificateSourceType};
pub use references::{CertificateRef, CertificateRefOrigin, IssuerSerial};
pub use revocation::{
    CrlIdentifier, CrlRef, OcspIdentifier, OcspRef, ResponderId, RevocationIdentifier,
    TimestampCrlSource, TimestampOcspSource,
};
pub use timestamp_type::TimestampType;
pub use token::TimestampToken;
