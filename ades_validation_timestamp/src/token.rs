// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The timestamp token model.
//!
//! A [`TimestampToken`] is decoded once from untrusted bytes; decoding
//! failures are terminal. What depends on external input (the signer
//! certificate, the data the imprint covers) is resolved lazily:
//! - the signer is resolved by [`TimestampToken::is_signed_by`] and, once
//!   resolved, never changes
//! - [`TimestampToken::is_signature_valid`] probes the embedded certificates
//!   and the candidate source at most once; [`TimestampToken::resolve_signer`]
//!   counts as that probe
//! - [`TimestampToken::match_data`] records the outcome of the latest
//!   comparison

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::algorithms::{DigestAlgorithm, SignatureAlgorithm};
use crate::certificate::CertificateToken;
use crate::cms::{self, MessageImprint, SignerIdentifier, SignerInfo, TstInfo};
use crate::error::TimestampParseError;
use crate::ids::TokenId;
use crate::pool::{CertificatePool, CertificateSourceType};
use crate::references::CertificateRef;
use crate::revocation::{TimestampCrlSource, TimestampOcspSource};
use crate::timestamp_type::TimestampType;

/// Certificates probed when no signer has been supplied explicitly.
#[derive(Clone)]
enum CandidateSource {
    Pool(Arc<CertificatePool>),
    List(Vec<Arc<CertificateToken>>),
}

impl CandidateSource {
    fn candidates(&self) -> Vec<Arc<CertificateToken>> {
        match self {
            Self::Pool(pool) => pool.certificates(),
            Self::List(list) => list.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum SignerState {
    Unresolved { probed: bool },
    Resolved {
        signer: Arc<CertificateToken>,
        algorithm: SignatureAlgorithm,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct ImprintState {
    data_found: bool,
    intact: bool,
}

#[derive(Debug)]
struct TokenState {
    signer: SignerState,
    imprint: ImprintState,
    invalidity_reason: Option<String>,
}

/// RFC 3161 timestamp token.
pub struct TimestampToken {
    id: TokenId,
    encoded: Vec<u8>,
    timestamp_type: TimestampType,
    tst_info: TstInfo,
    tst_info_encoded: Vec<u8>,
    signer_info: SignerInfo,
    certificates: Vec<Arc<CertificateToken>>,
    certificate_refs: Vec<CertificateRef>,
    crl_source: TimestampCrlSource,
    ocsp_source: TimestampOcspSource,
    candidates: CandidateSource,
    state: Mutex<TokenState>,
}

impl TimestampToken {
    /// Decodes `encoded`, registering embedded certificates in `pool`.
    pub fn parse(
        encoded: &[u8],
        timestamp_type: TimestampType,
        pool: &Arc<CertificatePool>,
    ) -> Result<Self, TimestampParseError> {
        Self::build(encoded, timestamp_type, |embedded| {
            let certificates = embedded
                .into_iter()
                .map(|c| pool.get_instance(c, CertificateSourceType::Timestamp))
                .collect();
            (certificates, CandidateSource::Pool(pool.clone()))
        })
    }

    /// Decodes `encoded`; `candidates` are probed after the embedded certificates.
    pub fn parse_with_candidates(
        encoded: &[u8],
        timestamp_type: TimestampType,
        candidates: Vec<Arc<CertificateToken>>,
    ) -> Result<Self, TimestampParseError> {
        Self::build(encoded, timestamp_type, |embedded| {
            let certificates = embedded.into_iter().map(Arc::new).collect();
            (certificates, CandidateSource::List(candidates))
        })
    }

    /// Decodes `encoded` with a fresh, private certificate pool.
    pub fn from_bytes(encoded: &[u8], timestamp_type: TimestampType) -> Result<Self, TimestampParseError> {
        Self::parse(encoded, timestamp_type, &Arc::new(CertificatePool::new()))
    }

    fn build(
        encoded: &[u8],
        timestamp_type: TimestampType,
        register: impl FnOnce(Vec<CertificateToken>) -> (Vec<Arc<CertificateToken>>, CandidateSource),
    ) -> Result<Self, TimestampParseError> {
        let decoded = cms::decode(encoded)?;
        let mut signer_info = decoded.signer;

        let mut embedded = decoded.certificates;
        for cert in std::mem::take(&mut signer_info.unsigned.cert_values) {
            cms::push_unique(&mut embedded, cert);
        }
        let (certificates, candidates) = register(embedded);

        let mut certificate_refs = signer_info.signing_certificate_refs.clone();
        certificate_refs.extend(std::mem::take(&mut signer_info.unsigned.complete_certificate_refs));

        let mut crl_source = TimestampCrlSource::default();
        for crl in decoded
            .crl_values
            .into_iter()
            .chain(std::mem::take(&mut signer_info.unsigned.crl_values))
        {
            crl_source.add_identifier(crl);
        }
        for reference in std::mem::take(&mut signer_info.unsigned.crl_refs) {
            crl_source.add_reference(reference);
        }

        let mut ocsp_source = TimestampOcspSource::default();
        for ocsp in decoded
            .ocsp_values
            .into_iter()
            .chain(std::mem::take(&mut signer_info.unsigned.ocsp_values))
        {
            ocsp_source.add_identifier(ocsp);
        }
        for reference in std::mem::take(&mut signer_info.unsigned.ocsp_refs) {
            ocsp_source.add_reference(reference);
        }

        let token = Self {
            id: TokenId::of(encoded),
            encoded: encoded.to_vec(),
            timestamp_type,
            tst_info: decoded.tst_info,
            tst_info_encoded: decoded.tst_info_encoded,
            signer_info,
            certificates,
            certificate_refs,
            crl_source,
            ocsp_source,
            candidates,
            state: Mutex::new(TokenState {
                signer: SignerState::Unresolved { probed: false },
                imprint: ImprintState::default(),
                invalidity_reason: None,
            }),
        };

        debug!(
            token_id = %token.id,
            timestamp_type = %timestamp_type,
            generation_time = %token.generation_time(),
            certificates = token.certificates.len(),
            "decoded timestamp token"
        );
        Ok(token)
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Identifier in the `T-<sha256>` form used by diagnostic data.
    pub fn dss_id(&self) -> String {
        format!("T-{}", self.id.to_hex())
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn timestamp_type(&self) -> TimestampType {
        self.timestamp_type
    }

    pub fn tst_info(&self) -> &TstInfo {
        &self.tst_info
    }

    /// Encoded `TSTInfo` (the signed content).
    pub fn tst_info_encoded(&self) -> &[u8] {
        &self.tst_info_encoded
    }

    pub fn generation_time(&self) -> DateTime<Utc> {
        self.tst_info.generation_time
    }

    pub fn message_imprint(&self) -> &MessageImprint {
        &self.tst_info.message_imprint
    }

    pub fn message_imprint_digest_algorithm(&self) -> DigestAlgorithm {
        self.tst_info.message_imprint.algorithm
    }

    pub fn message_imprint_digest(&self) -> &[u8] {
        &self.tst_info.message_imprint.digest
    }

    /// Digest algorithm of the `SignerInfo`.
    pub fn signed_data_digest_algorithm(&self) -> DigestAlgorithm {
        self.signer_info.digest_algorithm
    }

    pub fn signer_identifier(&self) -> &SignerIdentifier {
        &self.signer_info.sid
    }

    /// Embedded certificates: `SignedData.certificates` then `certValues`, without duplicates.
    pub fn certificates(&self) -> &[Arc<CertificateToken>] {
        &self.certificates
    }

    /// Signing-certificate references followed by `complete-certificate-refs` entries.
    pub fn certificate_refs(&self) -> &[CertificateRef] {
        &self.certificate_refs
    }

    pub fn crl_source(&self) -> &TimestampCrlSource {
        &self.crl_source
    }

    pub fn ocsp_source(&self) -> &TimestampOcspSource {
        &self.ocsp_source
    }

    /// True iff `candidate` is the signer: its identity matches the signer
    /// identifier and its key validates the signature.
    ///
    /// The first successful candidate becomes the resolved signer; afterwards
    /// only that certificate is reported as the signer.
    pub fn is_signed_by(&self, candidate: &Arc<CertificateToken>) -> bool {
        let mut state = self.state.lock();
        if let SignerState::Resolved { signer, .. } = &state.signer {
            return signer.id() == candidate.id();
        }
        self.try_resolve(&mut state, candidate)
    }

    /// True iff a signer is resolved.
    ///
    /// When nothing was resolved yet, [`Self::candidate_certificates`] are
    /// probed once. A failed probe is remembered; an explicit
    /// [`Self::is_signed_by`] can still resolve the signer later.
    pub fn is_signature_valid(&self) -> bool {
        let mut state = self.state.lock();
        match state.signer {
            SignerState::Resolved { .. } => true,
            SignerState::Unresolved { probed: true } => false,
            SignerState::Unresolved { probed: false } => {
                self.probe(&mut state, self.candidate_certificates())
            }
        }
    }

    /// Probes `candidates` in order until one is the signer.
    ///
    /// A failed run is recorded as the probe [`Self::is_signature_valid`]
    /// would otherwise perform.
    pub fn resolve_signer(&self, candidates: impl IntoIterator<Item = Arc<CertificateToken>>) -> bool {
        let mut state = self.state.lock();
        if let SignerState::Resolved { .. } = state.signer {
            return true;
        }
        self.probe(&mut state, candidates)
    }

    fn probe(
        &self,
        state: &mut TokenState,
        candidates: impl IntoIterator<Item = Arc<CertificateToken>>,
    ) -> bool {
        for candidate in candidates {
            if self.try_resolve(state, &candidate) {
                return true;
            }
        }
        state.signer = SignerState::Unresolved { probed: true };
        false
    }

    /// Embedded certificates followed by the candidate source, without duplicates.
    pub fn candidate_certificates(&self) -> Vec<Arc<CertificateToken>> {
        let mut out: Vec<Arc<CertificateToken>> = self.certificates.clone();
        for candidate in self.candidates.candidates() {
            if !out.iter().any(|c| c.id() == candidate.id()) {
                out.push(candidate);
            }
        }
        out
    }

    /// Candidates whose identity matches the signer identifier, signature aside.
    fn identified_certificates(&self) -> Vec<Arc<CertificateToken>> {
        self.candidate_certificates()
            .into_iter()
            .filter(|c| self.signer_info.sid.matches(c))
            .collect()
    }

    /// A signer is resolved, or some candidate matches the signer identifier.
    pub fn is_signing_certificate_identified(&self) -> bool {
        self.signing_certificate().is_some() || !self.identified_certificates().is_empty()
    }

    fn try_resolve(&self, state: &mut TokenState, candidate: &Arc<CertificateToken>) -> bool {
        match self.verify_with(candidate) {
            Ok(algorithm) => {
                debug!(token_id = %self.id, signer = %candidate.subject(), %algorithm, "resolved timestamp signer");
                state.signer = SignerState::Resolved {
                    signer: candidate.clone(),
                    algorithm,
                };
                state.invalidity_reason = None;
                true
            }
            Err(reason) => {
                debug!(token_id = %self.id, candidate = %candidate.subject(), %reason, "candidate is not the signer");
                state.invalidity_reason = Some(reason);
                false
            }
        }
    }

    fn verify_with(&self, candidate: &CertificateToken) -> Result<SignatureAlgorithm, String> {
        let signer = &self.signer_info;
        if !signer.sid.matches(candidate) {
            return Err("signer identifier does not match the certificate".to_string());
        }
        let key = candidate
            .key_algorithm()
            .ok_or("unsupported public key algorithm".to_string())?;
        let algorithm = SignatureAlgorithm::resolve(&signer.signature_algorithm, signer.digest_algorithm, signer.pss, key)
            .ok_or(format!(
                "unsupported signature algorithm {} for {} key",
                signer.signature_algorithm,
                key.name()
            ))?;

        let content_digest = signer.digest_algorithm.digest(&self.tst_info_encoded);
        if !bool::from(content_digest.as_slice().ct_eq(signer.message_digest.as_slice())) {
            return Err("message-digest attribute does not match the TSTInfo content".to_string());
        }

        candidate.verify_signature(algorithm, &signer.signed_attributes, &signer.signature)?;
        Ok(algorithm)
    }

    /// Algorithm of the verified signature; `None` until a signer is resolved.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        match &self.state.lock().signer {
            SignerState::Resolved { algorithm, .. } => Some(*algorithm),
            SignerState::Unresolved { .. } => None,
        }
    }

    pub fn signing_certificate(&self) -> Option<Arc<CertificateToken>> {
        match &self.state.lock().signer {
            SignerState::Resolved { signer, .. } => Some(signer.clone()),
            SignerState::Unresolved { .. } => None,
        }
    }

    /// Why the last candidate was rejected, while no signer is resolved.
    pub fn signature_invalidity_reason(&self) -> Option<String> {
        self.state.lock().invalidity_reason.clone()
    }

    /// Resolved signer's issuer equals its subject.
    pub fn is_self_signed(&self) -> bool {
        self.signing_certificate().is_some_and(|c| c.is_self_signed())
    }

    /// A signing-certificate reference matches the signer by digest (and
    /// issuer-serial when present).
    ///
    /// The signer is the resolved certificate or, while none is resolved, any
    /// candidate whose identity matches the signer identifier. The signature
    /// itself is not consulted.
    pub fn signing_certificate_reference_matches(&self) -> bool {
        let identified = match self.signing_certificate() {
            Some(signer) => vec![signer],
            None => self.identified_certificates(),
        };
        identified.iter().any(|certificate| {
            self.certificate_refs
                .iter()
                .filter(|r| r.origin.is_signing_certificate())
                .any(|r| r.matches_digest(certificate) && r.matches_issuer_serial(certificate))
        })
    }

    /// Compares the imprint with the digest of `original`.
    ///
    /// Empty input never matches and leaves the imprint flags untouched.
    pub fn match_data(&self, original: &[u8]) -> bool {
        if original.is_empty() {
            return false;
        }
        let computed = self.message_imprint_digest_algorithm().digest(original);
        self.record_imprint(&computed)
    }

    /// Compares the imprint with a precomputed digest.
    ///
    /// A digest under another algorithm counts as found but not intact.
    pub fn match_digest(&self, algorithm: DigestAlgorithm, digest: &[u8]) -> bool {
        if digest.is_empty() {
            return false;
        }
        if algorithm != self.message_imprint_digest_algorithm() {
            let mut state = self.state.lock();
            state.imprint = ImprintState {
                data_found: true,
                intact: false,
            };
            return false;
        }
        self.record_imprint(digest)
    }

    fn record_imprint(&self, computed: &[u8]) -> bool {
        let intact = bool::from(computed.ct_eq(self.message_imprint_digest()));
        self.state.lock().imprint = ImprintState {
            data_found: true,
            intact,
        };
        if !intact {
            debug!(token_id = %self.id, "message imprint does not match the supplied data");
        }
        intact
    }

    pub fn is_message_imprint_data_found(&self) -> bool {
        self.state.lock().imprint.data_found
    }

    pub fn is_message_imprint_data_intact(&self) -> bool {
        self.state.lock().imprint.intact
    }

    /// `TYPE: T-<id>: <generation time>`
    pub fn abbreviation(&self) -> String {
        format!(
            "{}: {}: {}",
            self.timestamp_type,
            self.dss_id(),
            self.generation_time().to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl fmt::Display for TimestampToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbreviation())
    }
}

impl fmt::Debug for TimestampToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampToken")
            .field("id", &self.dss_id())
            .field("type", &self.timestamp_type)
            .field("generation_time", &self.generation_time())
            .field("signer", &self.state.lock().signer)
            .finish()
    }
}
