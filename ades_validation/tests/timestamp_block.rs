// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use ades_validation::policy::{
    ConstraintStatus, Indication, LevelConstraint, MessageTag, SubIndication,
    TimestampConstraints,
};
use ades_validation::timestamp::{TimestampToken, TimestampType};
use ades_validation::ValidationContext;
use ades_validation_test_utils::{
    init_test_tracing, SigningCertificateForm, TestTsa, TokenOptions,
};

const DATA: &[u8] = b"timestamped bytes";

fn decode(encoded: &[u8]) -> TimestampToken {
    TimestampToken::from_bytes(encoded, TimestampType::ContentTimestamp).unwrap()
}

#[test]
fn valid_token_with_original_data_passes() {
    init_test_tracing();
    let tsa = TestTsa::new("Block TSA");
    let token = decode(&tsa.issue(DATA, &TokenOptions::default()));
    let context = ValidationContext::default();

    let result = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());

    assert!(result.is_passed(), "{result:?}");
    assert_eq!(result.entries().len(), 5);
    assert!(result
        .entries()
        .iter()
        .all(|e| e.status == ConstraintStatus::Ok));
}

#[test]
fn missing_data_is_indeterminate() {
    let tsa = TestTsa::new("Block TSA");
    let token = decode(&tsa.issue(DATA, &TokenOptions::default()));
    let context = ValidationContext::default();

    let result = context.timestamp_block(&token, None, &TimestampConstraints::default());

    assert_eq!(result.conclusion().indication(), Indication::Indeterminate);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::SignedDataNotFound)
    );
    assert_eq!(
        result.entries().last().map(|e| e.message),
        Some(MessageTag::BBB_CV_TSP_IRDOF)
    );
}

#[test]
fn tampered_data_is_a_hash_failure() {
    let tsa = TestTsa::new("Block TSA");
    let token = decode(&tsa.issue(DATA, &TokenOptions::default()));
    let context = ValidationContext::default();

    let result = context.timestamp_block(
        &token,
        Some(b"tampered bytes"),
        &TimestampConstraints::default(),
    );

    assert_eq!(result.conclusion().indication(), Indication::Failed);
    assert_eq!(result.conclusion().sub_indication(), Some(SubIndication::HashFailure));
}

#[test]
fn corrupted_signature_is_a_crypto_failure() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        corrupt_signature: true,
        ..TokenOptions::default()
    };
    let token = decode(&tsa.issue(DATA, &options));
    let context = ValidationContext::default();

    let result = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());

    assert_eq!(result.conclusion().indication(), Indication::Failed);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::SigCryptoFailure)
    );
    let error = &result.conclusion().errors()[0];
    assert_eq!(error.tag, MessageTag::BBB_CV_ISIT_ANS);
    assert!(error.additional_info.is_some());
    // The embedded certificate is identified and matches the digest reference.
    assert!(result.conclusion().warnings().is_empty());
}

#[test]
fn corrupted_signature_under_strict_digest_policy_is_still_a_crypto_failure() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        corrupt_signature: true,
        ..TokenOptions::default()
    };
    let token = decode(&tsa.issue(DATA, &options));
    let context = ValidationContext::default();
    let strict = TimestampConstraints {
        signing_certificate_digest_matches: LevelConstraint::Fail,
        ..TimestampConstraints::default()
    };

    let result = context.timestamp_block(&token, Some(DATA), &strict);

    assert_eq!(result.conclusion().indication(), Indication::Failed);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::SigCryptoFailure)
    );
    assert_eq!(result.entries().len(), 5);
    assert_eq!(result.entries()[1].message, MessageTag::BBB_ICS_ICDVV);
    assert_eq!(result.entries()[1].status, ConstraintStatus::Ok);
}

#[test]
fn unknown_signer_is_no_signing_certificate_found() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let token = decode(&tsa.issue(DATA, &options));
    let context = ValidationContext::default();

    let result = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());

    assert_eq!(result.conclusion().indication(), Indication::Indeterminate);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::NoSigningCertificateFound)
    );
    assert_eq!(result.entries().len(), 1);
}

#[test]
fn pool_certificate_identifies_the_signer() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    let context = ValidationContext::default();
    context.add_certificate_token_for_verification(tsa.certificate());
    let token = context
        .add_timestamp_bytes(&tsa.issue(DATA, &options), TimestampType::SignatureTimestamp)
        .unwrap();
    context.validate();

    let result = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());
    assert!(result.is_passed(), "{result:?}");
}

#[test]
fn session_pool_does_not_identify_a_privately_decoded_signer() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        include_certificate: false,
        ..TokenOptions::default()
    };
    // Decoded with its own empty pool; the session pool knows the signer.
    let token = decode(&tsa.issue(DATA, &options));
    let context = ValidationContext::default();
    context.add_certificate_token_for_verification(tsa.certificate());

    let result = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());

    assert_eq!(result.conclusion().indication(), Indication::Indeterminate);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::NoSigningCertificateFound)
    );
    assert_eq!(result.entries().len(), 1);
    assert!(!token.is_signing_certificate_identified());
    assert!(!token.is_signature_valid());
}

#[test]
fn digest_reference_mismatch_warns_by_default() {
    let tsa = TestTsa::new("Block TSA");
    let options = TokenOptions {
        signing_certificate: SigningCertificateForm::WrongDigest,
        ..TokenOptions::default()
    };
    let token = decode(&tsa.issue(DATA, &options));
    let context = ValidationContext::default();

    let lenient = context.timestamp_block(&token, Some(DATA), &TimestampConstraints::default());
    assert!(lenient.is_passed());
    assert_eq!(lenient.conclusion().warnings().len(), 1);
    assert_eq!(lenient.conclusion().warnings()[0].tag, MessageTag::BBB_ICS_ICDVV_ANS);

    let strict = TimestampConstraints {
        signing_certificate_digest_matches: LevelConstraint::Fail,
        ..TimestampConstraints::default()
    };
    let result = context.timestamp_block(&token, Some(DATA), &strict);
    assert_eq!(result.conclusion().indication(), Indication::Indeterminate);
    assert_eq!(
        result.conclusion().sub_indication(),
        Some(SubIndication::NoSigningCertificateFound)
    );
}

#[test]
fn ignored_imprint_checks_pass_without_data() {
    let tsa = TestTsa::new("Block TSA");
    let token = decode(&tsa.issue(DATA, &TokenOptions::default()));
    let context = ValidationContext::default();
    let constraints = TimestampConstraints {
        message_imprint_data_found: LevelConstraint::Ignore,
        message_imprint_data_intact: LevelConstraint::Ignore,
        ..TimestampConstraints::default()
    };

    let result = context.timestamp_block(&token, None, &constraints);

    assert!(result.is_passed());
    assert_eq!(result.entries().len(), 3);
}
