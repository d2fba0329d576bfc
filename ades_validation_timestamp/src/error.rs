// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::ber::BerError;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate is not valid DER: {0}")]
    Decode(String),

    #[error("certificate validity period is out of range")]
    InvalidValidity,
}

/// Terminal failure while constructing a [`crate::TimestampToken`].
#[derive(Debug, Error)]
pub enum TimestampParseError {
    #[error("malformed encoding: {0}")]
    Encoding(#[from] BerError),

    #[error("unexpected content type {found} (expected {expected})")]
    UnexpectedContentType {
        expected: &'static str,
        found: String,
    },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("unsupported digest algorithm {0}")]
    UnsupportedDigestAlgorithm(String),

    #[error("timestamp token must have exactly one signer, found {0}")]
    SignerCount(usize),

    #[error("embedded certificate: {0}")]
    Certificate(#[from] CertificateError),
}

impl TimestampParseError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
