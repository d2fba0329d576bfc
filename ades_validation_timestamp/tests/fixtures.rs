// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Timestamp tokens issued by production TSAs.

use std::path::PathBuf;
use std::sync::Arc;

use ades_validation_timestamp::{
    CertificatePool, CertificateRefOrigin, CertificateSourceType, CertificateToken,
    DigestAlgorithm, SignatureAlgorithm, SignerIdentifier, TimestampToken, TimestampType,
};

fn testdata_path(file_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(file_name)
}

fn read_testdata(file_name: &str) -> Vec<u8> {
    std::fs::read(testdata_path(file_name)).expect("read testdata")
}

fn load(file_name: &str, timestamp_type: TimestampType) -> TimestampToken {
    TimestampToken::from_bytes(&read_testdata(file_name), timestamp_type).expect("decode token")
}

#[test]
fn token_with_embedded_certificate_verifies_itself() {
    let token = load("ee_tst_with_certs.tst", TimestampType::SignatureTimestamp);

    assert_eq!(token.certificates().len(), 1);
    assert_eq!(token.signature_algorithm(), None);

    assert!(token.is_signature_valid());
    assert_eq!(token.signature_algorithm(), Some(SignatureAlgorithm::RsaSha512));
    assert!(token.signature_invalidity_reason().is_none());

    let signer = token.signing_certificate().expect("signer resolved");
    assert!(Arc::ptr_eq(&signer, &token.certificates()[0]));
    assert!(token.signing_certificate_reference_matches());
}

#[test]
fn imprint_matches_the_original_data() {
    let token = load("ee_tst_with_certs.tst", TimestampType::SignatureTimestamp);

    assert!(!token.is_message_imprint_data_found());
    assert!(token.match_data(b"Hello world"));
    assert!(token.is_message_imprint_data_found());
    assert!(token.is_message_imprint_data_intact());
    assert_eq!(token.message_imprint_digest_algorithm(), DigestAlgorithm::Sha512);
}

#[test]
fn token_without_certificates_needs_an_external_signer() {
    let token = load("ee_tst_without_certs.tst", TimestampType::SignatureTimestamp);

    assert!(token.certificates().is_empty());
    assert!(!token.is_signature_valid());
    assert!(token.signing_certificate().is_none());
    assert!(token.signature_invalidity_reason().is_none());
    assert!(token.match_data(b"Hello world"));

    let tsu = Arc::new(
        CertificateToken::from_der(&read_testdata("ee_tsu_cert.cer")).expect("decode TSU cert"),
    );
    assert!(token.is_signed_by(&tsu));
    assert!(token.is_signature_valid());
    assert_eq!(token.signing_certificate().map(|c| c.id()), Some(tsu.id()));
}

#[test]
fn pool_certificates_are_searched_for_the_signer() {
    let pool = Arc::new(CertificatePool::new());
    let tsu = CertificateToken::from_der(&read_testdata("ee_tsu_cert.cer")).expect("decode TSU cert");
    pool.get_instance(tsu, CertificateSourceType::Other);

    let token = TimestampToken::parse(
        &read_testdata("ee_tst_without_certs.tst"),
        TimestampType::SignatureTimestamp,
        &pool,
    )
    .expect("decode token");

    assert!(token.is_signature_valid());
}

#[test]
fn cades_signature_timestamp_sources() {
    let token = load("cades_signature_timestamp.tst", TimestampType::SignatureTimestamp);

    assert_eq!(token.certificates().len(), 2);
    assert_eq!(token.certificate_refs().len(), 2);
    assert_eq!(
        token
            .certificate_refs()
            .iter()
            .filter(|r| r.origin == CertificateRefOrigin::CompleteCertificateRefs)
            .count(),
        1
    );
    assert_eq!(token.crl_source().identifiers().len(), 1);
    assert_eq!(token.crl_source().references().len(), 1);
    assert!(token.ocsp_source().is_empty());
}

#[test]
fn cades_archive_timestamp_sources() {
    let token = load("cades_archive_timestamp_v2.tst", TimestampType::ArchiveTimestamp);

    assert_eq!(token.certificates().len(), 2);
    assert_eq!(token.certificate_refs().len(), 1);
    assert_eq!(token.crl_source().identifiers().len(), 1);
    assert!(token.crl_source().references().is_empty());
    assert!(token.ocsp_source().identifiers().is_empty());
    assert!(token.ocsp_source().references().is_empty());
    assert!(token.tst_info().ordering);
}

#[test]
fn qualified_timestamp_with_both_signing_certificate_attributes() {
    let token = load("timestamp_sig_cert.tst", TimestampType::SignatureTimestamp);

    assert_eq!(token.certificates().len(), 1);
    assert_eq!(token.certificate_refs().len(), 2);
    assert!(token.certificate_refs().iter().all(|r| r.origin.is_signing_certificate()));
    assert!(token.crl_source().is_empty());
    assert!(token.ocsp_source().is_empty());
    assert!(matches!(
        token.signer_identifier(),
        SignerIdentifier::IssuerAndSerialNumber { .. }
    ));

    assert_eq!(token.signature_algorithm(), None);
    let embedded = token.certificates()[0].clone();
    assert!(embedded.subject().contains("Certum QTST 2017"));
    assert!(token.is_signed_by(&embedded));
    assert_eq!(token.signature_algorithm(), Some(SignatureAlgorithm::RsaSha256));
    assert!(!token.is_self_signed());
    assert!(token.signing_certificate_reference_matches());
}

#[test]
fn foreign_certificate_is_not_the_signer() {
    let token = load("timestamp_sig_cert.tst", TimestampType::SignatureTimestamp);
    let foreign = Arc::new(
        CertificateToken::from_der(&read_testdata("ee_tsu_cert.cer")).expect("decode TSU cert"),
    );

    assert!(!token.is_signed_by(&foreign));
    assert!(token.signature_invalidity_reason().is_some());
    assert!(token.signing_certificate().is_none());

    // The embedded signer still resolves afterwards.
    assert!(token.is_signature_valid());
    assert!(!token.is_signed_by(&foreign));
}

#[test]
fn empty_or_wrong_data_does_not_match() {
    let token = load("timestamp_sig_cert.tst", TimestampType::SignatureTimestamp);

    assert!(!token.match_data(&[]));
    assert!(!token.is_message_imprint_data_found());
    assert!(!token.is_message_imprint_data_intact());

    assert!(!token.match_data(&[1, 2, 3]));
    assert!(token.is_message_imprint_data_found());
    assert!(!token.is_message_imprint_data_intact());
}

#[test]
fn identical_encodings_share_an_id() {
    let bytes = read_testdata("ee_tst_with_certs.tst");
    let first = TimestampToken::from_bytes(&bytes, TimestampType::SignatureTimestamp).unwrap();
    let second = TimestampToken::from_bytes(&bytes, TimestampType::ArchiveTimestamp).unwrap();
    let other = load("timestamp_sig_cert.tst", TimestampType::SignatureTimestamp);

    assert_eq!(first.id(), second.id());
    assert_ne!(first.id(), other.id());
    assert!(first.dss_id().starts_with("T-"));
}

#[test]
fn abbreviation_names_type_id_and_time() {
    let token = load("ee_tst_with_certs.tst", TimestampType::SignatureTimestamp);
    let abbreviation = token.abbreviation();

    assert!(abbreviation.starts_with("SIGNATURE_TIMESTAMP: T-"));
    assert!(abbreviation.ends_with("2018-08-01T14:31:01.000Z"));
    assert_eq!(token.to_string(), abbreviation);
}

#[test]
fn embedded_certificates_are_shared_through_the_pool() {
    let pool = Arc::new(CertificatePool::new());
    let bytes = read_testdata("cades_signature_timestamp.tst");

    let first = TimestampToken::parse(&bytes, TimestampType::SignatureTimestamp, &pool).unwrap();
    let second = TimestampToken::parse(&bytes, TimestampType::SignatureTimestamp, &pool).unwrap();

    assert_eq!(pool.len(), 2);
    for (a, b) in first.certificates().iter().zip(second.certificates()) {
        assert!(Arc::ptr_eq(a, b));
        assert!(pool.sources(&a.id()).contains(&CertificateSourceType::Timestamp));
    }
}
