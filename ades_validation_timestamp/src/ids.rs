// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use sha2::{Digest, Sha256};

/// Content-derived identifier of a token (certificate, timestamp, CRL, OCSP response).
///
/// Two tokens with identical encodings share the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    pub fn of(encoded: &[u8]) -> Self {
        let digest = Sha256::digest(encoded);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        TokenId(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
