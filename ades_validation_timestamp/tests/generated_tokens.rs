// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use ades_validation_test_utils::{
    fake_crl, fake_ocsp_response, init_test_tracing, SignerIdForm, SigningCertificateForm,
    TestTsa, TokenOptions,
};
use ades_validation_timestamp::{
    CertificatePool, CertificateRefOrigin, DigestAlgorithm, PssParameters, SignatureAlgorithm,
    SignerIdentifier, TimestampParseError, TimestampToken, TimestampType,
};

const DATA: &[u8] = b"signature value bytes";

fn token(tsa: &TestTsa, options: &TokenOptions) -> TimestampToken {
    TimestampToken::from_bytes(&tsa.issue(DATA, options), TimestampType::SignatureTimestamp)
        .expect("decode generated token")
}

#[test]
fn issuer_and_serial_signer_verifies() {
    init_test_tracing();
    let tsa = TestTsa::new("Test TSA");
    let token = token(&tsa, &TokenOptions::default());

    assert!(matches!(
        token.signer_identifier(),
        SignerIdentifier::IssuerAndSerialNumber { .. }
    ));
    assert!(token.is_signature_valid());
    assert_eq!(token.signature_algorithm(), Some(SignatureAlgorithm::EcdsaSha256));
    assert!(token.is_signed_by(&tsa.certificate()));
    assert!(token.signing_certificate_reference_matches());
    assert!(token.match_data(DATA));
}

#[test]
fn subject_key_identifier_signer_verifies() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        signer_id: SignerIdForm::SubjectKeyIdentifier,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert!(matches!(
        token.signer_identifier(),
        SignerIdentifier::SubjectKeyIdentifier(_)
    ));
    assert!(token.is_signature_valid());
}

#[test]
fn indefinite_length_envelope_decodes_and_verifies() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        indefinite_length: true,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert!(token.is_signature_valid());
    assert!(token.match_data(DATA));
    assert_eq!(token.tst_info().nonce.as_deref(), Some(&[0x5e, 0xed][..]));
}

#[test]
fn corrupted_signature_is_reported() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        corrupt_signature: true,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert!(!token.is_signature_valid());
    assert!(token.signature_invalidity_reason().is_some());
    assert!(token.signing_certificate().is_none());
    assert_eq!(token.signature_algorithm(), None);

    // A failed search is not repeated.
    assert!(!token.is_signature_valid());
    assert!(!token.is_signed_by(&tsa.certificate()));
}

#[test]
fn failed_signer_search_is_remembered() {
    let tsa = TestTsa::new("Test TSA");
    let other = TestTsa::new("Other TSA");
    let token = token(&tsa, &TokenOptions::default());

    // The embedded signer would be found by `is_signature_valid` on its own.
    assert!(!token.resolve_signer(vec![other.certificate()]));
    assert!(!token.is_signature_valid());
    assert!(token.signature_invalidity_reason().is_some());

    assert!(token.resolve_signer(token.candidate_certificates()));
    assert!(token.is_signature_valid());
}

#[test]
fn sha3_message_imprint_matches() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        imprint_algorithm: DigestAlgorithm::Sha3_256,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert_eq!(token.message_imprint_digest_algorithm(), DigestAlgorithm::Sha3_256);
    assert_eq!(token.message_imprint_digest().len(), 32);
    assert!(token.match_data(DATA));
    assert!(!token.match_digest(DigestAlgorithm::Sha256, &DigestAlgorithm::Sha256.digest(DATA)));
    assert!(token.is_signature_valid());
}

#[test]
fn rsa_pss_signer_verifies_with_its_parameters() {
    let tsa = TestTsa::new_rsa_pss("PSS TSA");
    let signed = token(&tsa, &TokenOptions::default());

    assert!(signed.is_signature_valid(), "{:?}", signed.signature_invalidity_reason());
    assert_eq!(
        signed.signature_algorithm(),
        Some(SignatureAlgorithm::RsaSsaPss(PssParameters {
            digest: DigestAlgorithm::Sha256,
            mask_digest: DigestAlgorithm::Sha256,
            salt_len: 32,
        }))
    );
    assert!(signed.signing_certificate_reference_matches());

    let options = TokenOptions {
        corrupt_signature: true,
        ..TokenOptions::default()
    };
    let corrupted = token(&tsa, &options);
    assert!(!corrupted.is_signature_valid());
}

#[test]
fn token_from_another_tsa_is_not_signed_by_it() {
    let tsa = TestTsa::new("Test TSA");
    let other = TestTsa::new("Other TSA");
    let token = token(&tsa, &TokenOptions::default());

    assert!(!token.is_signed_by(&other.certificate()));
    assert!(token.is_signed_by(&tsa.certificate()));
    assert!(!token.is_signed_by(&other.certificate()));
}

#[test]
fn missing_signing_certificate_attribute_is_rejected() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        signing_certificate: SigningCertificateForm::Omit,
        ..TokenOptions::default()
    };
    let encoded = tsa.issue(DATA, &options);

    let err = TimestampToken::from_bytes(&encoded, TimestampType::SignatureTimestamp).unwrap_err();
    assert!(matches!(err, TimestampParseError::MissingField(_)), "{err}");
}

#[test]
fn signing_certificate_v1_reference_matches() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        signing_certificate: SigningCertificateForm::V1,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert_eq!(token.certificate_refs().len(), 1);
    let reference = &token.certificate_refs()[0];
    assert_eq!(reference.origin, CertificateRefOrigin::SigningCertificate);
    assert_eq!(reference.digest_algorithm, DigestAlgorithm::Sha1);

    assert!(token.is_signature_valid());
    assert!(token.signing_certificate_reference_matches());
}

#[test]
fn wrong_signing_certificate_digest_does_not_match() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        signing_certificate: SigningCertificateForm::WrongDigest,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert!(token.is_signature_valid());
    assert!(!token.signing_certificate_reference_matches());
}

#[test]
fn embedded_revocation_material_is_collected() {
    let tsa = TestTsa::issued_by_ca("Test TSA", "Test CA");
    let ca = tsa.ca_certificate().expect("CA-issued TSA");
    let options = TokenOptions {
        crls: vec![fake_crl(1)],
        ocsp_responses: vec![fake_ocsp_response(2)],
        cert_values: vec![ca.encoded().to_vec(), tsa.certificate_der().to_vec()],
        complete_certificate_refs: vec![ca.encoded().to_vec()],
        revocation_value_crls: vec![fake_crl(3), fake_crl(1)],
        revocation_value_ocsp: vec![fake_ocsp_response(4)],
        crl_refs: vec![fake_crl(3), fake_crl(99)],
        ocsp_refs: vec![fake_ocsp_response(4)],
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);

    assert_eq!(token.certificates().len(), 2);
    assert_eq!(token.certificate_refs().len(), 2);

    let crls = token.crl_source();
    assert_eq!(crls.identifiers().len(), 2);
    assert_eq!(crls.references().len(), 2);
    assert_eq!(crls.orphan_references().len(), 1);

    let ocsps = token.ocsp_source();
    assert_eq!(ocsps.identifiers().len(), 2);
    assert_eq!(ocsps.references().len(), 1);
    assert!(ocsps.orphan_references().is_empty());

    assert!(token.is_signature_valid());
    assert!(!token.is_self_signed());
}

#[test]
fn self_signed_tsa_is_detected() {
    let tsa = TestTsa::new("Self-signed TSA");
    let token = token(&tsa, &TokenOptions::default());

    assert!(!token.is_self_signed());
    assert!(token.is_signature_valid());
    assert!(token.is_self_signed());
}

#[test]
fn candidates_are_searched_when_the_certificate_is_not_embedded() {
    let tsa = TestTsa::issued_by_ca("Test TSA", "Test CA");
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let encoded = tsa.issue(DATA, &options);

    let without = TimestampToken::parse_with_candidates(
        &encoded,
        TimestampType::ContentTimestamp,
        tsa.ca_certificate().into_iter().collect(),
    )
    .unwrap();
    assert!(without.certificates().is_empty());
    assert!(!without.is_signature_valid());

    let with = TimestampToken::parse_with_candidates(
        &encoded,
        TimestampType::ContentTimestamp,
        vec![tsa.ca_certificate().unwrap(), tsa.certificate()],
    )
    .unwrap();
    assert!(with.is_signature_valid());
    assert_eq!(with.signing_certificate().map(|c| c.id()), Some(tsa.certificate().id()));
}

#[test]
fn pool_is_consulted_for_tokens_without_certificates() {
    let tsa = TestTsa::new("Test TSA");
    let pool = Arc::new(CertificatePool::new());
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let token =
        TimestampToken::parse(&tsa.issue(DATA, &options), TimestampType::ArchiveTimestamp, &pool)
            .unwrap();
    assert!(pool.is_empty());

    pool.add(tsa.certificate(), ades_validation_timestamp::CertificateSourceType::Other);
    assert!(token.is_signature_valid());
}

#[test]
fn digest_comparison_requires_the_imprint_algorithm() {
    let tsa = TestTsa::new("Test TSA");
    let options = TokenOptions {
        imprint_algorithm: DigestAlgorithm::Sha384,
        ..TokenOptions::default()
    };
    let token = token(&tsa, &options);
    let sha384 = DigestAlgorithm::Sha384.digest(DATA);
    let sha256 = DigestAlgorithm::Sha256.digest(DATA);

    assert!(!token.match_digest(DigestAlgorithm::Sha256, &sha256));
    assert!(token.is_message_imprint_data_found());
    assert!(!token.is_message_imprint_data_intact());

    assert!(token.match_digest(DigestAlgorithm::Sha384, &sha384));
    assert!(token.is_message_imprint_data_intact());

    // The latest non-empty comparison wins.
    assert!(!token.match_data(b"something else"));
    assert!(!token.is_message_imprint_data_intact());
    assert!(!token.match_digest(DigestAlgorithm::Sha384, &[]));
    assert!(!token.is_message_imprint_data_intact());
}

#[test]
fn precomputed_imprint_is_carried_verbatim() {
    let tsa = TestTsa::new("Test TSA");
    let imprint = DigestAlgorithm::Sha256.digest(b"archive data");
    let encoded = tsa.issue_for_digest(&imprint, &TokenOptions::default());
    let token = TimestampToken::from_bytes(&encoded, TimestampType::ArchiveTimestamp).unwrap();

    assert_eq!(token.message_imprint_digest(), imprint.as_slice());
    assert!(token.match_data(b"archive data"));
    assert_eq!(
        token.generation_time().to_rfc3339(),
        "2024-03-15T10:15:30.250+00:00"
    );
}

#[test]
fn signed_token_is_shareable_across_threads() {
    let tsa = TestTsa::new("Test TSA");
    let token = Arc::new(token(&tsa, &TokenOptions::default()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let token = token.clone();
            std::thread::spawn(move || token.is_signature_valid() && token.match_data(DATA))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert!(token.signing_certificate().is_some());
}
