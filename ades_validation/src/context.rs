// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Validation session state.
//!
//! A [`ValidationContext`] owns the certificate pool shared by every token of
//! one validation session. Timestamp tokens are registered once per content
//! digest and verified at most once: [`ValidationContext::validate`] only
//! processes tokens that have not been processed by an earlier call.

use std::collections::HashSet;
use std::sync::Arc;

use ades_validation_policy::{ChainResult, TimestampConstraints};
use ades_validation_timestamp::{
    CertificatePool, CertificateSourceType, CertificateToken, TimestampToken, TimestampType,
    TokenId,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::timestamp_block::timestamp_block;

/// Options controlling how a [`ValidationContext`] processes tokens.
#[derive(Debug, Clone)]
pub struct ValidationContextOptions {
    /// Register the certificates embedded in each token into the shared pool
    /// before resolving its signer.
    pub register_embedded_certificates: bool,
}

impl Default for ValidationContextOptions {
    fn default() -> Self {
        Self {
            register_embedded_certificates: true,
        }
    }
}

/// Counts for one [`ValidationContext::validate`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Tokens processed by this run.
    pub processed: usize,
    /// Of those, tokens whose signature verified.
    pub valid: usize,
}

#[derive(Default)]
struct ContextState {
    registered: Vec<Arc<TimestampToken>>,
    registered_ids: HashSet<TokenId>,
    processed: Vec<Arc<TimestampToken>>,
    processed_ids: HashSet<TokenId>,
}

pub struct ValidationContext {
    pool: Arc<CertificatePool>,
    options: ValidationContextOptions,
    state: Mutex<ContextState>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(Arc::new(CertificatePool::new()))
    }
}

impl ValidationContext {
    pub fn new(pool: Arc<CertificatePool>) -> Self {
        Self {
            pool,
            options: ValidationContextOptions::default(),
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Configure options starting from the defaults.
    pub fn with_options(mut self, configure: impl FnOnce(&mut ValidationContextOptions)) -> Self {
        configure(&mut self.options);
        self
    }

    pub fn options(&self) -> &ValidationContextOptions {
        &self.options
    }

    pub fn certificate_pool(&self) -> &Arc<CertificatePool> {
        &self.pool
    }

    /// Registers `token` for verification.
    ///
    /// Returns `false` when a token with the same encoding is already registered.
    pub fn add_timestamp_token_for_verification(&self, token: Arc<TimestampToken>) -> bool {
        let mut state = self.state.lock();
        if !state.registered_ids.insert(token.id()) {
            debug!(token_id = %token.id(), "timestamp token already registered");
            return false;
        }
        state.registered.push(token);
        true
    }

    /// Decodes `encoded` against the session pool and registers the result.
    pub fn add_timestamp_bytes(
        &self,
        encoded: &[u8],
        timestamp_type: TimestampType,
    ) -> Result<Arc<TimestampToken>, ValidationError> {
        let token = Arc::new(TimestampToken::parse(encoded, timestamp_type, &self.pool)?);
        self.add_timestamp_token_for_verification(token.clone());
        Ok(token)
    }

    /// Makes `certificate` available as a signer candidate.
    pub fn add_certificate_token_for_verification(
        &self,
        certificate: Arc<CertificateToken>,
    ) -> Arc<CertificateToken> {
        self.pool.add(certificate, CertificateSourceType::Other)
    }

    /// Decodes a DER certificate and adds it to the pool with `source`.
    pub fn add_certificate_der(
        &self,
        der: &[u8],
        source: CertificateSourceType,
    ) -> Result<Arc<CertificateToken>, ValidationError> {
        let certificate = CertificateToken::from_der(der)?;
        Ok(self.pool.get_instance(certificate, source))
    }

    /// Verifies every registered token not processed yet.
    pub fn validate(&self) -> ValidationSummary {
        let mut state = self.state.lock();
        let pending: Vec<Arc<TimestampToken>> = state
            .registered
            .iter()
            .filter(|token| !state.processed_ids.contains(&token.id()))
            .cloned()
            .collect();

        let mut summary = ValidationSummary::default();
        for token in pending {
            let valid = self.verify_timestamp(&token);
            summary.processed += 1;
            summary.valid += usize::from(valid);
            state.processed_ids.insert(token.id());
            state.processed.push(token);
        }

        info!(
            processed = summary.processed,
            valid = summary.valid,
            total_processed = state.processed.len(),
            pool_size = self.pool.len(),
            "validation run complete"
        );
        summary
    }

    fn verify_timestamp(&self, token: &TimestampToken) -> bool {
        if self.options.register_embedded_certificates {
            for certificate in token.certificates() {
                self.pool
                    .add(certificate.clone(), CertificateSourceType::Timestamp);
            }
        }

        // One search over the token's own candidates and the session pool;
        // a miss is recorded on the token so `is_signature_valid` does not repeat it.
        if token.signing_certificate().is_none() {
            let mut candidates = token.candidate_certificates();
            for certificate in self.pool.certificates() {
                if !candidates.iter().any(|c| c.id() == certificate.id()) {
                    candidates.push(certificate);
                }
            }
            token.resolve_signer(candidates);
        }

        let valid = token.is_signature_valid();
        debug!(
            token_id = %token.id(),
            timestamp_type = %token.timestamp_type(),
            valid,
            signer = token.signing_certificate().map(|c| c.subject().to_string()).as_deref(),
            "timestamp token processed"
        );
        valid
    }

    /// Every processed token, in processing order.
    pub fn processed_timestamps(&self) -> Vec<Arc<TimestampToken>> {
        self.state.lock().processed.clone()
    }

    /// Registered tokens, processed or not.
    pub fn registered_timestamps(&self) -> Vec<Arc<TimestampToken>> {
        self.state.lock().registered.clone()
    }

    /// Runs the timestamp building block for `token`.
    pub fn timestamp_block(
        &self,
        token: &TimestampToken,
        original_data: Option<&[u8]>,
        constraints: &TimestampConstraints,
    ) -> ChainResult {
        timestamp_block(token, original_data, constraints)
    }
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ValidationContext")
            .field("pool", &self.pool)
            .field("registered", &state.registered.len())
            .field("processed", &state.processed.len())
            .finish()
    }
}
