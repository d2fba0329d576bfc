// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;
use std::sync::Arc;

use ades_validation::timestamp::{
    CertificatePool, CertificateSourceType, TimestampToken, TimestampType,
};
use ades_validation::{ValidationContext, ValidationSummary};
use ades_validation_test_utils::{init_test_tracing, TestTsa, TokenOptions};

fn timestamp_testdata(file_name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("ades_validation_timestamp")
        .join("testdata")
        .join(file_name);
    std::fs::read(path).expect("read testdata")
}

#[test]
fn same_token_registered_twice_is_processed_once() {
    init_test_tracing();
    let tsa = TestTsa::new("Context TSA");
    let context = ValidationContext::default();
    let encoded = tsa.issue(b"data", &TokenOptions::default());

    let first = Arc::new(
        TimestampToken::parse(&encoded, TimestampType::SignatureTimestamp, context.certificate_pool())
            .unwrap(),
    );
    let second = Arc::new(
        TimestampToken::parse(&encoded, TimestampType::SignatureTimestamp, context.certificate_pool())
            .unwrap(),
    );

    assert!(context.add_timestamp_token_for_verification(first.clone()));
    assert!(!context.add_timestamp_token_for_verification(second));
    assert!(!context.add_timestamp_token_for_verification(first));

    let summary = context.validate();
    assert_eq!(summary, ValidationSummary { processed: 1, valid: 1 });
    assert_eq!(context.processed_timestamps().len(), 1);
}

#[test]
fn token_without_certificates_is_verified_with_a_pool_certificate() {
    init_test_tracing();
    let context = ValidationContext::default();
    context
        .add_certificate_der(&timestamp_testdata("ee_tsu_cert.cer"), CertificateSourceType::Other)
        .unwrap();
    let token = context
        .add_timestamp_bytes(
            &timestamp_testdata("ee_tst_without_certs.tst"),
            TimestampType::SignatureTimestamp,
        )
        .unwrap();

    assert_eq!(context.validate(), ValidationSummary { processed: 1, valid: 1 });

    let processed = context.processed_timestamps();
    assert_eq!(processed.len(), 1);
    assert!(Arc::ptr_eq(&processed[0], &token));
    assert!(processed[0].is_signature_valid());
    assert!(processed[0].match_data(b"Hello world"));
    assert!(!processed[0].match_data(b"Hello World"));
}

#[test]
fn certificate_added_after_parsing_is_still_a_candidate() {
    let tsa = TestTsa::new("Late TSA");
    let context = ValidationContext::new(Arc::new(CertificatePool::new()));
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    context
        .add_timestamp_bytes(&tsa.issue(b"data", &options), TimestampType::ContentTimestamp)
        .unwrap();

    context.add_certificate_token_for_verification(tsa.certificate());
    assert_eq!(context.validate().valid, 1);
}

#[test]
fn token_candidates_take_part_in_the_session_search() {
    let tsa = TestTsa::new("Listed TSA");
    let context = ValidationContext::default();
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let token = Arc::new(
        TimestampToken::parse_with_candidates(
            &tsa.issue(b"data", &options),
            TimestampType::SignatureTimestamp,
            vec![tsa.certificate()],
        )
        .unwrap(),
    );
    context.add_timestamp_token_for_verification(token.clone());

    assert_eq!(context.validate(), ValidationSummary { processed: 1, valid: 1 });
    assert_eq!(token.signing_certificate().map(|c| c.id()), Some(tsa.certificate().id()));
}

#[test]
fn failed_session_search_is_not_repeated() {
    let tsa = TestTsa::new("Unknown TSA");
    let context = ValidationContext::default();
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let token = context
        .add_timestamp_bytes(&tsa.issue(b"data", &options), TimestampType::SignatureTimestamp)
        .unwrap();
    assert_eq!(context.validate(), ValidationSummary { processed: 1, valid: 0 });

    // The session search already ran; the token does not search again.
    context.add_certificate_token_for_verification(tsa.certificate());
    assert!(!token.is_signature_valid());
    assert!(token.is_signed_by(&tsa.certificate()));
    assert!(token.is_signature_valid());
}

#[test]
fn invalid_tokens_are_processed_too() {
    let tsa = TestTsa::new("Broken TSA");
    let context = ValidationContext::default();
    let options = TokenOptions {
        corrupt_signature: true,
        ..TokenOptions::default()
    };
    let token = context
        .add_timestamp_bytes(&tsa.issue(b"data", &options), TimestampType::ArchiveTimestamp)
        .unwrap();

    assert_eq!(context.validate(), ValidationSummary { processed: 1, valid: 0 });
    assert!(!token.is_signature_valid());
    assert_eq!(context.processed_timestamps().len(), 1);
}

#[test]
fn later_runs_only_process_new_tokens() {
    let tsa = TestTsa::new("Incremental TSA");
    let context = ValidationContext::default();

    context
        .add_timestamp_bytes(&tsa.issue(b"one", &TokenOptions::default()), TimestampType::SignatureTimestamp)
        .unwrap();
    assert_eq!(context.validate().processed, 1);
    assert_eq!(context.validate().processed, 0);

    context
        .add_timestamp_bytes(&tsa.issue(b"two", &TokenOptions::default()), TimestampType::ArchiveTimestamp)
        .unwrap();
    assert_eq!(context.validate(), ValidationSummary { processed: 1, valid: 1 });

    let types: Vec<_> = context
        .processed_timestamps()
        .iter()
        .map(|t| t.timestamp_type())
        .collect();
    assert_eq!(
        types,
        vec![TimestampType::SignatureTimestamp, TimestampType::ArchiveTimestamp]
    );
    assert_eq!(context.registered_timestamps().len(), 2);
}

#[test]
fn embedded_certificates_reach_the_shared_pool() {
    let tsa = TestTsa::new("Embedding TSA");
    let encoded = tsa.issue(b"data", &TokenOptions::default());
    let context = ValidationContext::default();
    let token = Arc::new(
        TimestampToken::parse_with_candidates(&encoded, TimestampType::SignatureTimestamp, Vec::new())
            .unwrap(),
    );
    context.add_timestamp_token_for_verification(token);
    assert!(context.certificate_pool().is_empty());

    context.validate();
    assert!(context.certificate_pool().contains(&tsa.certificate().id()));
}

#[test]
fn registration_of_embedded_certificates_can_be_disabled() {
    let tsa = TestTsa::new("Private TSA");
    let encoded = tsa.issue(b"data", &TokenOptions::default());
    let context = ValidationContext::default().with_options(|o| {
        o.register_embedded_certificates = false;
    });
    let token = Arc::new(
        TimestampToken::parse_with_candidates(&encoded, TimestampType::SignatureTimestamp, Vec::new())
            .unwrap(),
    );
    context.add_timestamp_token_for_verification(token);

    assert_eq!(context.validate().valid, 1);
    assert!(context.certificate_pool().is_empty());
}

#[test]
fn undecodable_bytes_are_not_registered() {
    let context = ValidationContext::default();

    assert!(context
        .add_timestamp_bytes(&[0x30, 0x03, 0x02, 0x01], TimestampType::SignatureTimestamp)
        .is_err());
    assert!(context.registered_timestamps().is_empty());
    assert_eq!(context.validate(), ValidationSummary::default());
}
