// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Basic building block for one timestamp token.
//!
//! Identification of the signing certificate runs before cryptographic
//! verification: a token with no candidate signer concludes
//! `INDETERMINATE/NO_SIGNING_CERTIFICATE_FOUND` rather than a signature
//! failure. Candidates are the token's own (embedded certificates and the
//! pool or list it was decoded with), the same set signature verification
//! probes.

use ades_validation_policy::{
    Chain, ChainResult, Check, FailureIndication, MessageTag, SubIndication, TimestampConstraints,
};
use ades_validation_timestamp::TimestampToken;
use tracing::debug;

/// Evaluates `token` against `constraints`.
///
/// When `original_data` is given it is matched against the message imprint
/// first; otherwise the outcome of the latest `match_data`/`match_digest`
/// call on the token is used.
pub fn timestamp_block(
    token: &TimestampToken,
    original_data: Option<&[u8]>,
    constraints: &TimestampConstraints,
) -> ChainResult {
    if let Some(data) = original_data {
        token.match_data(data);
    }

    let has_candidate = token.is_signing_certificate_identified();
    debug!(token_id = %token.id(), has_candidate, "timestamp building block");

    let no_signing_certificate =
        FailureIndication::indeterminate(SubIndication::NoSigningCertificateFound);

    Chain::new(format!("Timestamp {}", token.dss_id()))
        .then(
            Check::new(
                MessageTag::BBB_ICS_ISCI,
                MessageTag::BBB_ICS_ISCI_ANS,
                constraints.signing_certificate_identified,
                move || has_candidate,
            )
            .on_failure(no_signing_certificate),
        )
        .then(
            Check::new(
                MessageTag::BBB_ICS_ICDVV,
                MessageTag::BBB_ICS_ICDVV_ANS,
                constraints.signing_certificate_digest_matches,
                || token.signing_certificate_reference_matches(),
            )
            .on_failure(no_signing_certificate),
        )
        .then(
            Check::new(
                MessageTag::BBB_CV_TSP_IRDOF,
                MessageTag::BBB_CV_TSP_IRDOF_ANS,
                constraints.message_imprint_data_found,
                || token.is_message_imprint_data_found(),
            )
            .on_failure(FailureIndication::indeterminate(
                SubIndication::SignedDataNotFound,
            )),
        )
        .then(
            Check::new(
                MessageTag::BBB_CV_TSP_IRDOI,
                MessageTag::BBB_CV_TSP_IRDOI_ANS,
                constraints.message_imprint_data_intact,
                || token.is_message_imprint_data_intact(),
            )
            .on_failure(FailureIndication::failed(Some(SubIndication::HashFailure))),
        )
        .then(
            Check::new(
                MessageTag::BBB_CV_ISIT,
                MessageTag::BBB_CV_ISIT_ANS,
                constraints.signature_intact,
                || token.is_signature_valid(),
            )
            .on_failure(FailureIndication::failed(Some(
                SubIndication::SigCryptoFailure,
            )))
            .with_additional_info(|| token.signature_invalidity_reason()),
        )
        .execute()
}
