// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test-only utilities for AdES validation scenarios.
//!
//! Kept out of the production crates: a [`TestTsa`] issuing real timestamp
//! tokens, fakes for the diagnostic wrapper traits and tracing setup.

pub mod der;
pub mod fakes;
pub mod tsa;

pub use fakes::{FakeCertificate, FakeRevocation};
pub use tsa::{
    fake_crl, fake_ocsp_response, SignerIdForm, SigningCertificateForm, TestTsa, TokenOptions,
};

use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; `RUST_LOG` selects the level.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

