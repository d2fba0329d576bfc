// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::sync::Arc;

use ades_validation_test_utils::TestTsa;
use ades_validation_timestamp::{CertificatePool, CertificateSourceType, CertificateToken};

#[test]
fn same_encoding_yields_one_instance() {
    let tsa = TestTsa::new("Pool TSA");
    let pool = CertificatePool::new();

    let first = pool.get_instance(
        CertificateToken::from_der(tsa.certificate_der()).unwrap(),
        CertificateSourceType::Timestamp,
    );
    let second = pool.get_instance(
        CertificateToken::from_der(tsa.certificate_der()).unwrap(),
        CertificateSourceType::TrustedStore,
    );

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len(), 1);
    assert_eq!(
        pool.sources(&first.id()),
        BTreeSet::from([CertificateSourceType::Timestamp, CertificateSourceType::TrustedStore])
    );
}

#[test]
fn distinct_certificates_keep_insertion_order() {
    let a = TestTsa::new("A");
    let b = TestTsa::new("B");
    let pool = CertificatePool::new();

    pool.add(a.certificate(), CertificateSourceType::Other);
    pool.add(b.certificate(), CertificateSourceType::Other);
    pool.add(a.certificate(), CertificateSourceType::Signature);

    let ids: Vec<_> = pool.certificates().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![a.certificate().id(), b.certificate().id()]);
    assert!(pool.contains(&b.certificate().id()));
    assert!(pool.get(&b.certificate().id()).is_some());
}

#[test]
fn unknown_certificate_has_no_sources() {
    let pool = CertificatePool::new();
    let tsa = TestTsa::new("Unknown");

    assert!(pool.is_empty());
    assert!(pool.get(&tsa.certificate().id()).is_none());
    assert!(pool.sources(&tsa.certificate().id()).is_empty());
}

#[test]
fn lookup_by_issuer_serial_and_key_identifier() {
    let tsa = TestTsa::issued_by_ca("Leaf TSA", "Root CA");
    let ca = tsa.ca_certificate().unwrap();
    let leaf = tsa.certificate();
    let pool = CertificatePool::new();
    pool.add(ca.clone(), CertificateSourceType::TrustedStore);
    pool.add(leaf.clone(), CertificateSourceType::Timestamp);

    let by_issuer_serial = pool.find_by_issuer_serial(leaf.issuer_raw(), leaf.serial_number());
    assert_eq!(by_issuer_serial.len(), 1);
    assert_eq!(by_issuer_serial[0].id(), leaf.id());

    let ski = ca.subject_key_identifier().unwrap();
    let by_ski = pool.find_by_subject_key_identifier(ski);
    assert_eq!(by_ski.len(), 1);
    assert_eq!(by_ski[0].id(), ca.id());

    assert!(pool.find_by_subject_key_identifier(&[0xde, 0xad]).is_empty());
}

#[test]
fn concurrent_registration_converges_on_one_instance() {
    let tsa = TestTsa::new("Shared");
    let der = tsa.certificate_der().to_vec();
    let pool = Arc::new(CertificatePool::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let der = der.clone();
            std::thread::spawn(move || {
                pool.get_instance(
                    CertificateToken::from_der(&der).unwrap(),
                    CertificateSourceType::Timestamp,
                )
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(pool.len(), 1);
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}
