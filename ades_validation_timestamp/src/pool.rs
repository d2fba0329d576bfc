// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared, deduplicating certificate registry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::certificate::CertificateToken;
use crate::ids::TokenId;

/// Where a certificate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CertificateSourceType {
    Signature,
    Timestamp,
    OcspResponse,
    Crl,
    TrustedStore,
    Other,
}

struct PoolEntry {
    token: Arc<CertificateToken>,
    sources: BTreeSet<CertificateSourceType>,
}

#[derive(Default)]
struct PoolInner {
    by_id: HashMap<TokenId, usize>,
    entries: Vec<PoolEntry>,
}

/// Content-addressed certificate arena owned by a validation session.
///
/// Insertion is insert-if-absent: the first token registered for a given
/// encoding becomes the canonical instance and every later registration of
/// the same encoding returns it. Entries are never removed or replaced, only
/// their set of sources grows.
#[derive(Default)]
pub struct CertificatePool {
    inner: RwLock<PoolInner>,
}

impl CertificatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` (or finds its existing instance) and records `source`.
    pub fn get_instance(
        &self,
        token: CertificateToken,
        source: CertificateSourceType,
    ) -> Arc<CertificateToken> {
        self.add(Arc::new(token), source)
    }

    /// Like [`Self::get_instance`] for an already shared token.
    pub fn add(
        &self,
        token: Arc<CertificateToken>,
        source: CertificateSourceType,
    ) -> Arc<CertificateToken> {
        let mut inner = self.inner.write();
        if let Some(&index) = inner.by_id.get(&token.id()) {
            let entry = &mut inner.entries[index];
            entry.sources.insert(source);
            return entry.token.clone();
        }
        let index = inner.entries.len();
        inner.by_id.insert(token.id(), index);
        inner.entries.push(PoolEntry {
            token: token.clone(),
            sources: BTreeSet::from([source]),
        });
        token
    }

    pub fn get(&self, id: &TokenId) -> Option<Arc<CertificateToken>> {
        let inner = self.inner.read();
        inner.by_id.get(id).map(|&i| inner.entries[i].token.clone())
    }

    pub fn contains(&self, id: &TokenId) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    /// Sources recorded for a certificate; empty when unknown.
    pub fn sources(&self, id: &TokenId) -> BTreeSet<CertificateSourceType> {
        let inner = self.inner.read();
        inner
            .by_id
            .get(id)
            .map(|&i| inner.entries[i].sources.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every certificate in insertion order.
    pub fn certificates(&self) -> Vec<Arc<CertificateToken>> {
        self.inner.read().entries.iter().map(|e| e.token.clone()).collect()
    }

    pub fn find_by_issuer_serial(&self, issuer: &[u8], serial: &[u8]) -> Vec<Arc<CertificateToken>> {
        self.filter(|t| t.matches_issuer_serial(issuer, serial))
    }

    pub fn find_by_subject_key_identifier(&self, ski: &[u8]) -> Vec<Arc<CertificateToken>> {
        self.filter(|t| t.subject_key_identifier() == Some(ski))
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter(&self, pred: impl Fn(&CertificateToken) -> bool) -> Vec<Arc<CertificateToken>> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|e| pred(&e.token))
            .map(|e| e.token.clone())
            .collect()
    }
}

impl std::fmt::Debug for CertificatePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificatePool")
            .field("len", &self.len())
            .finish()
    }
}
