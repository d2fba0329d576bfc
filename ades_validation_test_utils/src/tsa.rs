// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory timestamp authority issuing real CMS timestamp tokens.

use std::sync::{Arc, OnceLock};

use ades_validation_timestamp::oid;
use ades_validation_timestamp::{CertificateToken, DigestAlgorithm};
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey as _;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, PKCS_ECDSA_P256_SHA256};
use rsa::pkcs8::EncodePrivateKey as _;
use rsa::{Pss, RsaPrivateKey};
use sha2::Sha256;

use crate::der;

const TSA_POLICY: &str = "1.3.6.1.4.1.311.97.1";

/// How the `SignerInfo` names its certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignerIdForm {
    #[default]
    IssuerAndSerialNumber,
    SubjectKeyIdentifier,
}

/// Which signing-certificate attribute is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningCertificateForm {
    /// `signingCertificate` with a SHA-1 `ESSCertID`.
    V1,
    /// `signingCertificateV2` with the default SHA-256 hash.
    #[default]
    V2,
    /// No signing-certificate attribute (an invalid token).
    Omit,
    /// `signingCertificateV2` whose hash does not match the certificate.
    WrongDigest,
}

#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub imprint_algorithm: DigestAlgorithm,
    pub include_certificate: bool,
    pub signer_id: SignerIdForm,
    pub signing_certificate: SigningCertificateForm,
    /// BER indefinite lengths for the envelope and a chunked `eContent`.
    pub indefinite_length: bool,
    pub generation_time: String,
    pub nonce: Option<u64>,
    /// CRLs in `SignedData.crls`.
    pub crls: Vec<Vec<u8>>,
    /// OCSP responses in `SignedData.crls` as other revocation info.
    pub ocsp_responses: Vec<Vec<u8>>,
    /// `certValues` unsigned attribute.
    pub cert_values: Vec<Vec<u8>>,
    /// Certificates referenced by `complete-certificate-refs`.
    pub complete_certificate_refs: Vec<Vec<u8>>,
    /// `revocationValues` CRLs.
    pub revocation_value_crls: Vec<Vec<u8>>,
    /// `revocationValues` OCSP responses.
    pub revocation_value_ocsp: Vec<Vec<u8>>,
    /// CRLs referenced by `complete-revocation-refs`.
    pub crl_refs: Vec<Vec<u8>>,
    /// OCSP responses referenced by `complete-revocation-refs`.
    pub ocsp_refs: Vec<Vec<u8>>,
    pub corrupt_signature: bool,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            imprint_algorithm: DigestAlgorithm::Sha256,
            include_certificate: true,
            signer_id: SignerIdForm::default(),
            signing_certificate: SigningCertificateForm::default(),
            indefinite_length: false,
            generation_time: "20240315101530.250Z".to_string(),
            nonce: Some(0x5eed),
            crls: Vec::new(),
            ocsp_responses: Vec::new(),
            cert_values: Vec::new(),
            complete_certificate_refs: Vec::new(),
            revocation_value_crls: Vec::new(),
            revocation_value_ocsp: Vec::new(),
            crl_refs: Vec::new(),
            ocsp_refs: Vec::new(),
            corrupt_signature: false,
        }
    }
}

enum TsaKey {
    P256(SigningKey),
    /// RSASSA-PSS with SHA-256, MGF1-SHA-256 and a 32 byte salt.
    RsaPss(RsaPrivateKey),
}

impl TsaKey {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::P256(key) => {
                let signature: Signature = key.sign(message);
                signature.to_der().as_bytes().to_vec()
            }
            Self::RsaPss(key) => {
                let hashed = DigestAlgorithm::Sha256.digest(message);
                key.sign_with_rng(&mut rand::thread_rng(), Pss::new::<Sha256>(), &hashed)
                    .expect("RSASSA-PSS signature")
            }
        }
    }

    fn signature_algorithm(&self) -> Vec<u8> {
        match self {
            Self::P256(_) => der::algorithm_identifier(oid::ECDSA_WITH_SHA256, false),
            Self::RsaPss(_) => {
                let sha256 = der::algorithm_identifier(oid::SHA256, true);
                der::sequence(&[
                    der::oid(oid::RSASSA_PSS),
                    der::sequence(&[
                        der::context(0, &[sha256.clone()]),
                        der::context(1, &[der::sequence(&[der::oid(oid::MGF1), sha256])]),
                        der::context(2, &[der::small_integer(32)]),
                    ]),
                ])
            }
        }
    }
}

/// RSA keys are slow to generate; one per test binary is enough.
fn shared_rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("RSA key generation"))
}

/// Timestamp authority backed by an rcgen certificate; P-256 unless built with
/// [`TestTsa::new_rsa_pss`].
pub struct TestTsa {
    certificate: Arc<CertificateToken>,
    ca_certificate: Option<Arc<CertificateToken>>,
    signing_key: TsaKey,
}

impl TestTsa {
    /// Self-signed TSA certificate.
    pub fn new(common_name: &str) -> Self {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).expect("key generation");
        let cert = tsa_params(common_name)
            .self_signed(&key_pair)
            .expect("self-signed TSA certificate");
        Self::from_parts(cert.der(), &key_pair, None)
    }

    /// TSA certificate issued by a freshly generated CA.
    pub fn issued_by_ca(common_name: &str, ca_common_name: &str) -> Self {
        let ca_key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).expect("CA key generation");
        let ca_cert = tsa_params(ca_common_name)
            .self_signed(&ca_key)
            .expect("self-signed CA certificate");

        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).expect("key generation");
        let cert = tsa_params(common_name)
            .signed_by(&key_pair, &ca_cert, &ca_key)
            .expect("CA-issued TSA certificate");

        let ca = CertificateToken::from_der(ca_cert.der()).expect("rcgen CA certificate decodes");
        Self::from_parts(cert.der(), &key_pair, Some(Arc::new(ca)))
    }

    /// Self-signed RSA TSA whose tokens are signed with RSASSA-PSS.
    pub fn new_rsa_pss(common_name: &str) -> Self {
        let rsa_key = shared_rsa_key().clone();
        let pkcs8 = rsa_key.to_pkcs8_der().expect("RSA PKCS#8 encoding");
        let key_pair = KeyPair::try_from(pkcs8.as_bytes()).expect("rcgen RSA key pair");
        let cert = tsa_params(common_name)
            .self_signed(&key_pair)
            .expect("self-signed RSA TSA certificate");
        let certificate = CertificateToken::from_der(cert.der()).expect("rcgen certificate decodes");
        Self {
            certificate: Arc::new(certificate),
            ca_certificate: None,
            signing_key: TsaKey::RsaPss(rsa_key),
        }
    }

    fn from_parts(
        der: &[u8],
        key_pair: &KeyPair,
        ca_certificate: Option<Arc<CertificateToken>>,
    ) -> Self {
        let certificate = CertificateToken::from_der(der).expect("rcgen certificate decodes");
        let signing_key =
            SigningKey::from_pkcs8_der(&key_pair.serialize_der()).expect("P-256 PKCS#8 key");
        Self {
            certificate: Arc::new(certificate),
            ca_certificate,
            signing_key: TsaKey::P256(signing_key),
        }
    }

    pub fn certificate(&self) -> Arc<CertificateToken> {
        self.certificate.clone()
    }

    pub fn certificate_der(&self) -> &[u8] {
        self.certificate.encoded()
    }

    pub fn ca_certificate(&self) -> Option<Arc<CertificateToken>> {
        self.ca_certificate.clone()
    }

    /// Issues a timestamp token over `data`.
    pub fn issue(&self, data: &[u8], options: &TokenOptions) -> Vec<u8> {
        let imprint = options.imprint_algorithm.digest(data);
        self.issue_for_digest(&imprint, options)
    }

    /// Issues a timestamp token over a precomputed imprint.
    pub fn issue_for_digest(&self, imprint: &[u8], options: &TokenOptions) -> Vec<u8> {
        let tst_info = self.tst_info(imprint, options);

        let signed_attributes = der::set(&self.signed_attributes(&tst_info, options));
        let mut signature = self.signing_key.sign(&signed_attributes);
        if options.corrupt_signature {
            let last = signature.len() - 1;
            signature[last] ^= 0x01;
        }

        let mut signer_info = vec![
            der::small_integer(match options.signer_id {
                SignerIdForm::IssuerAndSerialNumber => 1,
                SignerIdForm::SubjectKeyIdentifier => 3,
            }),
            self.signer_identifier(options.signer_id),
            der::algorithm_identifier(oid::SHA256, true),
            // [0] IMPLICIT SET OF Attribute
            der::implicit(0, &signed_attributes),
            self.signing_key.signature_algorithm(),
            der::octet_string(&signature),
        ];
        let unsigned = self.unsigned_attributes(options);
        if !unsigned.is_empty() {
            signer_info.push(der::implicit(1, &der::set(&unsigned)));
        }

        let encapsulated = match options.indefinite_length {
            true => der::sequence(&[
                der::oid(oid::TST_INFO),
                der::indefinite(0xa0, &der::chunked_octet_string(&tst_info, 64)),
            ]),
            false => der::sequence(&[
                der::oid(oid::TST_INFO),
                der::context(0, &[der::octet_string(&tst_info)]),
            ]),
        };

        let mut signed_data = vec![
            der::small_integer(3),
            der::set(&[der::algorithm_identifier(oid::SHA256, true)]),
            encapsulated,
        ];
        if options.include_certificate {
            signed_data.push(der::context(0, &[self.certificate.encoded().to_vec()]));
        }
        let revocation_choices: Vec<Vec<u8>> = options
            .crls
            .iter()
            .cloned()
            .chain(options.ocsp_responses.iter().map(|response| {
                der::context(1, &[der::oid(oid::RI_OCSP_RESPONSE), response.clone()])
            }))
            .collect();
        if !revocation_choices.is_empty() {
            signed_data.push(der::context(1, &revocation_choices));
        }
        signed_data.push(der::set(&[der::sequence(&signer_info)]));

        match options.indefinite_length {
            true => der::indefinite(
                0x30,
                &[
                    der::oid(oid::SIGNED_DATA),
                    der::indefinite(0xa0, &der::indefinite(0x30, &signed_data.concat())),
                ]
                .concat(),
            ),
            false => der::sequence(&[
                der::oid(oid::SIGNED_DATA),
                der::context(0, &[der::sequence(&signed_data)]),
            ]),
        }
    }

    fn tst_info(&self, imprint: &[u8], options: &TokenOptions) -> Vec<u8> {
        let mut fields = vec![
            der::small_integer(1),
            der::oid(TSA_POLICY),
            der::sequence(&[
                der::algorithm_identifier(options.imprint_algorithm.oid(), true),
                der::octet_string(imprint),
            ]),
            der::small_integer(0x0102_0304),
            der::generalized_time(&options.generation_time),
            der::sequence(&[der::small_integer(1)]),
        ];
        if let Some(nonce) = options.nonce {
            fields.push(der::small_integer(nonce));
        }
        // tsa [0] EXPLICIT GeneralName (directoryName)
        fields.push(der::context(
            0,
            &[der::context(4, &[self.certificate.subject_raw().to_vec()])],
        ));
        der::sequence(&fields)
    }

    fn signer_identifier(&self, form: SignerIdForm) -> Vec<u8> {
        match form {
            SignerIdForm::IssuerAndSerialNumber => der::sequence(&[
                self.certificate.issuer_raw().to_vec(),
                der::integer(self.certificate.serial_number()),
            ]),
            SignerIdForm::SubjectKeyIdentifier => der::context_primitive(
                0,
                self.certificate
                    .subject_key_identifier()
                    .expect("CA-flagged rcgen certificates carry a subject key identifier"),
            ),
        }
    }

    fn issuer_serial(&self) -> Vec<u8> {
        der::sequence(&[
            der::sequence(&[der::context(4, &[self.certificate.issuer_raw().to_vec()])]),
            der::integer(self.certificate.serial_number()),
        ])
    }

    fn signed_attributes(&self, tst_info: &[u8], options: &TokenOptions) -> Vec<Vec<u8>> {
        let mut attributes = vec![
            der::attribute(oid::ATTR_CONTENT_TYPE, der::oid(oid::TST_INFO)),
            der::attribute(
                oid::ATTR_MESSAGE_DIGEST,
                der::octet_string(&DigestAlgorithm::Sha256.digest(tst_info)),
            ),
        ];
        match options.signing_certificate {
            SigningCertificateForm::V1 => {
                let ess_cert_id = der::sequence(&[
                    der::octet_string(&self.certificate.digest(DigestAlgorithm::Sha1)),
                    self.issuer_serial(),
                ]);
                attributes.push(der::attribute(
                    oid::ATTR_SIGNING_CERTIFICATE,
                    der::sequence(&[der::sequence(&[ess_cert_id])]),
                ));
            }
            SigningCertificateForm::V2 | SigningCertificateForm::WrongDigest => {
                let mut hash = self.certificate.digest(DigestAlgorithm::Sha256);
                if options.signing_certificate == SigningCertificateForm::WrongDigest {
                    hash[0] ^= 0xff;
                }
                let ess_cert_id_v2 =
                    der::sequence(&[der::octet_string(&hash), self.issuer_serial()]);
                attributes.push(der::attribute(
                    oid::ATTR_SIGNING_CERTIFICATE_V2,
                    der::sequence(&[der::sequence(&[ess_cert_id_v2])]),
                ));
            }
            SigningCertificateForm::Omit => {}
        }
        attributes
    }

    fn unsigned_attributes(&self, options: &TokenOptions) -> Vec<Vec<u8>> {
        let mut attributes = Vec::new();

        if !options.cert_values.is_empty() {
            attributes.push(der::attribute(
                oid::ATTR_CERT_VALUES,
                der::sequence(&options.cert_values),
            ));
        }

        if !options.complete_certificate_refs.is_empty() {
            let refs: Vec<Vec<u8>> = options
                .complete_certificate_refs
                .iter()
                .map(|cert| der::sequence(&[other_hash(cert)]))
                .collect();
            attributes.push(der::attribute(
                oid::ATTR_COMPLETE_CERTIFICATE_REFS,
                der::sequence(&refs),
            ));
        }

        if !options.revocation_value_crls.is_empty() || !options.revocation_value_ocsp.is_empty() {
            let mut values = Vec::new();
            if !options.revocation_value_crls.is_empty() {
                values.push(der::context(0, &[der::sequence(&options.revocation_value_crls)]));
            }
            if !options.revocation_value_ocsp.is_empty() {
                values.push(der::context(1, &[der::sequence(&options.revocation_value_ocsp)]));
            }
            attributes.push(der::attribute(oid::ATTR_REVOCATION_VALUES, der::sequence(&values)));
        }

        if !options.crl_refs.is_empty() || !options.ocsp_refs.is_empty() {
            let mut crl_ocsp_ref = Vec::new();
            if !options.crl_refs.is_empty() {
                let validated: Vec<Vec<u8>> = options
                    .crl_refs
                    .iter()
                    .map(|crl| der::sequence(&[other_hash(crl)]))
                    .collect();
                // crlids [0] CRLListID { crls SEQUENCE OF CrlValidatedID }
                crl_ocsp_ref.push(der::context(
                    0,
                    &[der::sequence(&[der::sequence(&validated)])],
                ));
            }
            if !options.ocsp_refs.is_empty() {
                let responses: Vec<Vec<u8>> = options
                    .ocsp_refs
                    .iter()
                    .map(|response| {
                        let identifier = der::sequence(&[
                            der::context(
                                2,
                                &[der::octet_string(&DigestAlgorithm::Sha1.digest(
                                    self.certificate.public_key_info(),
                                ))],
                            ),
                            der::generalized_time(&options.generation_time),
                        ]);
                        der::sequence(&[identifier, other_hash(response)])
                    })
                    .collect();
                // ocspids [1] OcspListID { ocspResponses SEQUENCE OF OcspResponsesID }
                crl_ocsp_ref.push(der::context(
                    1,
                    &[der::sequence(&[der::sequence(&responses)])],
                ));
            }
            attributes.push(der::attribute(
                oid::ATTR_COMPLETE_REVOCATION_REFS,
                der::sequence(&[der::sequence(&crl_ocsp_ref)]),
            ));
        }

        attributes
    }
}

fn tsa_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).expect("certificate params");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params
        .distinguished_name
        .push(DnType::OrganizationName, "AdES Validation Tests");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

/// `OtherHash` as `OtherHashAlgAndValue` with SHA-256.
fn other_hash(value: &[u8]) -> Vec<u8> {
    der::sequence(&[
        der::algorithm_identifier(oid::SHA256, true),
        der::octet_string(&DigestAlgorithm::Sha256.digest(value)),
    ])
}

/// A stand-in CRL value: any `SEQUENCE` is accepted as an embedded CRL.
pub fn fake_crl(serial: u64) -> Vec<u8> {
    der::sequence(&[der::small_integer(serial), der::oid(oid::SHA256)])
}

/// A stand-in OCSP response value.
pub fn fake_ocsp_response(serial: u64) -> Vec<u8> {
    der::sequence(&[der::small_integer(serial), der::oid(oid::OCSP_BASIC)])
}
