// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::debug;

use crate::chain::{Chain, ChainResult, Check};
use crate::conclusion::FailureIndication;
use crate::indication::SubIndication;
use crate::level::LevelConstraint;
use crate::message::MessageTag;
use crate::policy::RevocationConstraints;
use crate::wrappers::{CertificateWrapper, RevocationType, RevocationWrapper};

fn try_later() -> FailureIndication {
    FailureIndication::indeterminate(SubIndication::TryLater)
}

/// Trusted, self-signed and `ocsp-nocheck` certificates are exempt from revocation checking.
pub fn requires_revocation_data(certificate: &dyn CertificateWrapper) -> bool {
    !certificate.is_trusted()
        && !certificate.is_self_signed()
        && !certificate.is_id_pkix_ocsp_no_check()
}

/// Passes when revocation data was found for `certificate`.
pub fn revocation_data_available_check<'a>(
    certificate: &'a dyn CertificateWrapper,
    level: LevelConstraint,
) -> Check<'a> {
    Check::new(
        MessageTag::BBB_XCV_IRDPFC,
        MessageTag::BBB_XCV_IRDPFC_ANS,
        level,
        move || !certificate.revocation_data().is_empty(),
    )
    .on_failure(try_later())
}

/// Same question as [`revocation_data_available_check`], asked about the
/// certificate that issued a piece of revocation data.
pub fn revocation_issuer_revocation_data_available_check<'a>(
    revocation_issuer: &'a dyn CertificateWrapper,
    level: LevelConstraint,
) -> Check<'a> {
    Check::new(
        MessageTag::BBB_XCV_IRDPFRC,
        MessageTag::BBB_XCV_IRDPFRC_ANS,
        level,
        move || !revocation_issuer.revocation_data().is_empty(),
    )
    .on_failure(try_later())
}

/// Passes when `certificate` does not appear in the chain that signed
/// `revocation`, i.e. the OCSP response does not vouch for its own signer.
pub fn self_issued_ocsp_check<'a>(
    certificate: &'a dyn CertificateWrapper,
    revocation: &'a dyn RevocationWrapper,
    level: LevelConstraint,
) -> Check<'a> {
    Check::new(
        MessageTag::BBB_XCV_REVOC_SELF_ISSUED_OCSP,
        MessageTag::BBB_XCV_REVOC_SELF_ISSUED_OCSP_ANS,
        level,
        move || !revocation.is_in_certificate_chain(certificate.id()),
    )
    .on_failure(try_later())
}

/// Decides whether `revocation` can be used to check `certificate`.
pub fn revocation_acceptance_chain(
    certificate: &dyn CertificateWrapper,
    revocation: &dyn RevocationWrapper,
    constraints: &RevocationConstraints,
) -> ChainResult {
    let revocation_issuer = revocation.signing_certificate();

    let mut chain = Chain::new(format!("Revocation acceptance {}", revocation.id()))
        .with_default_failure(try_later());

    if revocation.revocation_type() == RevocationType::Ocsp {
        chain.push(self_issued_ocsp_check(
            certificate,
            revocation,
            constraints.self_issued_ocsp,
        ));
    }

    if let Some(issuer) = revocation_issuer.as_deref() {
        if requires_revocation_data(issuer) {
            chain.push(revocation_issuer_revocation_data_available_check(
                issuer,
                constraints.revocation_issuer_revocation_data_available,
            ));
        }
    }

    chain.execute()
}

/// Revocation status checking for one certificate: data must be present and
/// at least one piece of it must be acceptable.
pub fn certificate_revocation_chain(
    certificate: &dyn CertificateWrapper,
    constraints: &RevocationConstraints,
) -> ChainResult {
    let title = format!("Certificate revocation {}", certificate.id());
    if !requires_revocation_data(certificate) {
        debug!(certificate = certificate.id(), "revocation checking not required");
        return Chain::new(title).execute();
    }

    let acceptance: Vec<(String, ChainResult)> = certificate
        .revocation_data()
        .iter()
        .map(|revocation| {
            (
                revocation.id().to_string(),
                revocation_acceptance_chain(certificate, revocation.as_ref(), constraints),
            )
        })
        .collect();

    let mut chain = Chain::new(title)
        .with_default_failure(try_later())
        .then(revocation_data_available_check(
            certificate,
            constraints.revocation_data_available,
        ));

    if !acceptance.is_empty() {
        let acceptance = &acceptance;
        chain.push(
            Check::new(
                MessageTag::BBB_XCV_SUB,
                MessageTag::BBB_XCV_SUB_ANS,
                LevelConstraint::Fail,
                move || acceptance.iter().any(|(_, result)| result.is_passed()),
            )
            .with_additional_info(move || {
                let rejected: Vec<&str> = acceptance
                    .iter()
                    .filter(|(_, result)| !result.is_passed())
                    .map(|(id, _)| id.as_str())
                    .collect();
                Some(format!("Rejected revocation data: {}", rejected.join(", ")))
            }),
        );
    }

    chain.execute()
}
