// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use ades_validation_timestamp::{CertificateError, TimestampParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("timestamp token decode failed: {0}")]
    TimestampDecode(#[from] TimestampParseError),

    #[error("certificate decode failed: {0}")]
    CertificateDecode(#[from] CertificateError),
}
