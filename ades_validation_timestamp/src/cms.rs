// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoding of the CMS `SignedData` envelope, its `SignerInfo` and the
//! `TSTInfo` payload of an RFC 3161 timestamp token.

use chrono::{DateTime, Utc};
use der_parser::asn1_rs::Tag;

use crate::algorithms::{DigestAlgorithm, PssParameters};
use crate::ber::{parse_single, BerError, Element, Reader};
use crate::certificate::CertificateToken;
use crate::error::TimestampParseError;
use crate::oid;
use crate::references::{CertificateRef, CertificateRefOrigin, IssuerSerial};
use crate::revocation::{CrlRef, OcspRef, ResponderId};

/// Digest of the timestamped data as declared by the TSA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageImprint {
    pub algorithm: DigestAlgorithm,
    pub digest: Vec<u8>,
}

/// `Accuracy` of the generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accuracy {
    pub seconds: u64,
    pub millis: u64,
    pub micros: u64,
}

/// Decoded `TSTInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TstInfo {
    pub version: u64,
    pub policy: String,
    pub message_imprint: MessageImprint,
    pub serial_number: Vec<u8>,
    pub generation_time: DateTime<Utc>,
    pub accuracy: Option<Accuracy>,
    pub ordering: bool,
    pub nonce: Option<Vec<u8>>,
    /// Encoded `GeneralName` of the TSA.
    pub tsa_name: Option<Vec<u8>>,
}

/// `SignerIdentifier` of the single `SignerInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerIdentifier {
    /// Encoded issuer `Name` and serial number content octets.
    IssuerAndSerialNumber { issuer: Vec<u8>, serial_number: Vec<u8> },
    SubjectKeyIdentifier(Vec<u8>),
}

impl SignerIdentifier {
    pub fn matches(&self, certificate: &CertificateToken) -> bool {
        match self {
            Self::IssuerAndSerialNumber {
                issuer,
                serial_number,
            } => certificate.matches_issuer_serial(issuer, serial_number),
            Self::SubjectKeyIdentifier(ski) => {
                certificate.subject_key_identifier() == Some(ski.as_slice())
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct UnsignedAttributes {
    pub cert_values: Vec<CertificateToken>,
    pub complete_certificate_refs: Vec<CertificateRef>,
    pub crl_values: Vec<Vec<u8>>,
    pub ocsp_values: Vec<Vec<u8>>,
    pub crl_refs: Vec<CrlRef>,
    pub ocsp_refs: Vec<OcspRef>,
}

#[derive(Debug)]
pub(crate) struct SignerInfo {
    pub sid: SignerIdentifier,
    pub digest_algorithm: DigestAlgorithm,
    /// `SET OF Attribute` encoding the signature is computed over.
    pub signed_attributes: Vec<u8>,
    pub message_digest: Vec<u8>,
    pub signature_algorithm: String,
    /// Present when `signature_algorithm` is `id-RSASSA-PSS`.
    pub pss: Option<PssParameters>,
    pub signature: Vec<u8>,
    pub signing_certificate_refs: Vec<CertificateRef>,
    pub unsigned: UnsignedAttributes,
}

#[derive(Debug)]
pub(crate) struct SignedTimestamp {
    pub tst_info_encoded: Vec<u8>,
    pub tst_info: TstInfo,
    pub certificates: Vec<CertificateToken>,
    pub crl_values: Vec<Vec<u8>>,
    pub ocsp_values: Vec<Vec<u8>>,
    pub signer: SignerInfo,
}

pub(crate) fn decode(encoded: &[u8]) -> Result<SignedTimestamp, TimestampParseError> {
    let content_info = parse_single(encoded, "ContentInfo")?.expect(Tag::Sequence, "ContentInfo")?;
    let mut ci = content_info.reader()?;
    let content_type = ci.read_expected(Tag::Oid, "contentType")?.oid()?;
    if content_type != oid::SIGNED_DATA {
        return Err(TimestampParseError::UnexpectedContentType {
            expected: oid::SIGNED_DATA,
            found: content_type,
        });
    }
    let explicit = ci.read_context(0)?.ok_or(BerError::Missing("content"))?;
    ci.finish("ContentInfo")?;
    let mut inner = explicit.reader()?;
    let signed_data = inner.read_expected(Tag::Sequence, "SignedData")?;
    inner.finish("content")?;

    let mut sd = signed_data.reader()?;
    sd.read_expected(Tag::Integer, "SignedData.version")?;
    sd.read_expected(Tag::Set, "digestAlgorithms")?;
    let encap = sd.read_expected(Tag::Sequence, "encapContentInfo")?;
    let tst_info_encoded = decode_encapsulated(&encap)?;

    let certificates = match sd.read_context(0)? {
        Some(set) => decode_certificate_set(&set)?,
        None => Vec::new(),
    };
    let (crl_values, ocsp_values) = match sd.read_context(1)? {
        Some(set) => decode_revocation_choices(&set)?,
        None => (Vec::new(), Vec::new()),
    };

    let signer_infos = sd.read_expected(Tag::Set, "signerInfos")?.children()?;
    sd.finish("SignedData")?;
    if signer_infos.len() != 1 {
        return Err(TimestampParseError::SignerCount(signer_infos.len()));
    }
    let signer = decode_signer_info(&signer_infos[0])?;

    let tst_info = decode_tst_info(&tst_info_encoded)?;

    Ok(SignedTimestamp {
        tst_info_encoded,
        tst_info,
        certificates,
        crl_values,
        ocsp_values,
        signer,
    })
}

fn decode_encapsulated(encap: &Element<'_>) -> Result<Vec<u8>, TimestampParseError> {
    let mut r = encap.reader()?;
    let content_type = r.read_expected(Tag::Oid, "eContentType")?.oid()?;
    if content_type != oid::TST_INFO {
        return Err(TimestampParseError::UnexpectedContentType {
            expected: oid::TST_INFO,
            found: content_type,
        });
    }
    let explicit = r
        .read_context(0)?
        .ok_or(TimestampParseError::MissingField("eContent"))?;
    r.finish("encapContentInfo")?;
    let mut inner = explicit.reader()?;
    let octets = inner.read()?;
    if !octets.is_universal(Tag::OctetString) {
        return Err(TimestampParseError::invalid("eContent", "not an OCTET STRING"));
    }
    inner.finish("eContent")?;
    Ok(octets.octets()?.into_owned())
}

fn decode_certificate_set(set: &Element<'_>) -> Result<Vec<CertificateToken>, TimestampParseError> {
    let mut out: Vec<CertificateToken> = Vec::new();
    for choice in set.children()? {
        // Only plain certificates; attribute and other certificate formats are skipped.
        if !choice.is_universal(Tag::Sequence) {
            continue;
        }
        push_unique(&mut out, CertificateToken::from_der(choice.raw())?);
    }
    Ok(out)
}

pub(crate) fn push_unique(out: &mut Vec<CertificateToken>, token: CertificateToken) {
    if !out.iter().any(|t| t.id() == token.id()) {
        out.push(token);
    }
}

type RevocationValues = (Vec<Vec<u8>>, Vec<Vec<u8>>);

fn decode_revocation_choices(set: &Element<'_>) -> Result<RevocationValues, TimestampParseError> {
    let mut crls = Vec::new();
    let mut ocsps = Vec::new();
    for choice in set.children()? {
        if choice.is_universal(Tag::Sequence) {
            crls.push(choice.raw().to_vec());
        } else if choice.is_context(1) {
            // OtherRevocationInfoFormat
            let mut r = choice.reader()?;
            let format = r.read_expected(Tag::Oid, "otherRevInfoFormat")?.oid()?;
            if format == oid::RI_OCSP_RESPONSE {
                ocsps.push(r.read()?.raw().to_vec());
            }
        }
    }
    Ok((crls, ocsps))
}

/// Algorithm OID and its parameters, if any.
fn decode_algorithm<'a>(tlv: &Element<'a>) -> Result<(String, Option<Element<'a>>), TimestampParseError> {
    let mut r = tlv.expect(Tag::Sequence, "AlgorithmIdentifier")?.reader()?;
    let algorithm = r.read_expected(Tag::Oid, "algorithm")?.oid()?;
    let parameters = match r.is_empty() {
        true => None,
        false => Some(r.read()?),
    };
    r.finish("AlgorithmIdentifier")?;
    Ok((algorithm, parameters))
}

fn decode_digest_algorithm(tlv: &Element<'_>) -> Result<DigestAlgorithm, TimestampParseError> {
    let (oid, _) = decode_algorithm(tlv)?;
    DigestAlgorithm::from_oid(&oid).ok_or(TimestampParseError::UnsupportedDigestAlgorithm(oid))
}

/// `RSASSA-PSS-params`; every field is explicitly tagged and defaulted.
fn decode_pss_parameters(parameters: Option<&Element<'_>>) -> Result<PssParameters, TimestampParseError> {
    let mut out = PssParameters::default();
    let Some(parameters) = parameters else {
        return Ok(out);
    };
    let mut r = parameters.expect(Tag::Sequence, "RSASSA-PSS-params")?.reader()?;
    if let Some(hash) = r.read_context(0)? {
        out.digest = decode_digest_algorithm(&hash.reader()?.read()?)?;
    }
    if let Some(mask) = r.read_context(1)? {
        let (mgf, hash) = decode_algorithm(&mask.reader()?.read()?)?;
        if mgf != oid::MGF1 {
            return Err(TimestampParseError::invalid("maskGenAlgorithm", format!("unsupported {mgf}")));
        }
        let hash = hash.ok_or(TimestampParseError::MissingField("MGF1 hash"))?;
        out.mask_digest = decode_digest_algorithm(&hash)?;
    }
    if let Some(salt) = r.read_context(2)? {
        let salt_len = salt.reader()?.read_expected(Tag::Integer, "saltLength")?.small_unsigned()?;
        out.salt_len = usize::try_from(salt_len)
            .map_err(|_| TimestampParseError::invalid("saltLength", "out of range"))?;
    }
    r.read_context(3)?;
    r.finish("RSASSA-PSS-params")?;
    Ok(out)
}

fn decode_signer_info(tlv: &Element<'_>) -> Result<SignerInfo, TimestampParseError> {
    let mut r = tlv.expect(Tag::Sequence, "SignerInfo")?.reader()?;
    r.read_expected(Tag::Integer, "SignerInfo.version")?;

    let sid_tlv = r.read()?;
    let sid = if sid_tlv.is_universal(Tag::Sequence) {
        let mut s = sid_tlv.reader()?;
        let issuer = s.read_expected(Tag::Sequence, "issuer")?.raw().to_vec();
        let serial_number = s.read_expected(Tag::Integer, "serialNumber")?.integer_bytes()?.to_vec();
        SignerIdentifier::IssuerAndSerialNumber {
            issuer,
            serial_number,
        }
    } else if sid_tlv.is_context(0) {
        // [0] IMPLICIT OCTET STRING, possibly in constructed form.
        SignerIdentifier::SubjectKeyIdentifier(sid_tlv.octets()?.into_owned())
    } else {
        return Err(TimestampParseError::invalid("sid", "unknown signer identifier form"));
    };

    let digest_algorithm = decode_digest_algorithm(&r.read()?)?;
    let signed = r
        .read_context(0)?
        .ok_or(TimestampParseError::MissingField("signedAttrs"))?;
    let (signature_algorithm, parameters) = decode_algorithm(&r.read()?)?;
    let pss = match signature_algorithm == oid::RSASSA_PSS {
        true => Some(decode_pss_parameters(parameters.as_ref())?),
        false => None,
    };
    let signature = r.read_expected(Tag::OctetString, "signature")?.octets()?.into_owned();
    let unsigned_tlv = r.read_context(1)?;
    r.finish("SignerInfo")?;

    let mut message_digest = None;
    let mut content_type_seen = false;
    let mut signing_certificate_refs = Vec::new();
    for attribute in signed.children()? {
        let (attr_type, value) = decode_attribute(&attribute)?;
        match attr_type.as_str() {
            oid::ATTR_MESSAGE_DIGEST => {
                message_digest = Some(value.expect(Tag::OctetString, "messageDigest")?.octets()?.into_owned());
            }
            oid::ATTR_CONTENT_TYPE => {
                let declared = value.expect(Tag::Oid, "contentType")?.oid()?;
                if declared != oid::TST_INFO {
                    return Err(TimestampParseError::UnexpectedContentType {
                        expected: oid::TST_INFO,
                        found: declared,
                    });
                }
                content_type_seen = true;
            }
            oid::ATTR_SIGNING_CERTIFICATE => {
                decode_signing_certificate(&value, CertificateRefOrigin::SigningCertificate, &mut signing_certificate_refs)?;
            }
            oid::ATTR_SIGNING_CERTIFICATE_V2 => {
                decode_signing_certificate(&value, CertificateRefOrigin::SigningCertificateV2, &mut signing_certificate_refs)?;
            }
            _ => {}
        }
    }
    let message_digest = message_digest.ok_or(TimestampParseError::MissingField("messageDigest attribute"))?;
    if !content_type_seen {
        return Err(TimestampParseError::MissingField("contentType attribute"));
    }
    if signing_certificate_refs.is_empty() {
        return Err(TimestampParseError::MissingField("signingCertificate attribute"));
    }

    let unsigned = match unsigned_tlv {
        Some(attrs) => decode_unsigned_attributes(&attrs)?,
        None => UnsignedAttributes::default(),
    };

    Ok(SignerInfo {
        sid,
        digest_algorithm,
        signed_attributes: signed.as_set_encoding()?,
        message_digest,
        signature_algorithm,
        pss,
        signature,
        signing_certificate_refs,
        unsigned,
    })
}

/// First value of an `Attribute`.
fn decode_attribute<'a>(tlv: &Element<'a>) -> Result<(String, Element<'a>), TimestampParseError> {
    let mut r = tlv.expect(Tag::Sequence, "Attribute")?.reader()?;
    let attr_type = r.read_expected(Tag::Oid, "attrType")?.oid()?;
    let mut values = r.read_expected(Tag::Set, "attrValues")?.reader()?;
    if values.is_empty() {
        return Err(TimestampParseError::invalid("attrValues", "empty attribute value set"));
    }
    Ok((attr_type, values.read()?))
}

fn decode_signing_certificate(
    value: &Element<'_>,
    origin: CertificateRefOrigin,
    out: &mut Vec<CertificateRef>,
) -> Result<(), TimestampParseError> {
    let mut r = value.expect(Tag::Sequence, "SigningCertificate")?.reader()?;
    let certs = r.read_expected(Tag::Sequence, "certs")?;
    for cert_id in certs.children()? {
        let mut c = cert_id.expect(Tag::Sequence, "ESSCertID")?.reader()?;
        let digest_algorithm = match origin {
            CertificateRefOrigin::SigningCertificateV2 => match c.read_optional(Tag::Sequence)? {
                Some(algorithm) => decode_digest_algorithm(&algorithm)?,
                None => DigestAlgorithm::Sha256,
            },
            _ => DigestAlgorithm::Sha1,
        };
        let digest = c.read_expected(Tag::OctetString, "certHash")?.octets()?.into_owned();
        let issuer_serial = decode_optional_issuer_serial(&mut c)?;
        out.push(CertificateRef {
            origin,
            digest_algorithm,
            digest,
            issuer_serial,
        });
    }
    Ok(())
}

fn decode_optional_issuer_serial(r: &mut Reader<'_>) -> Result<Option<IssuerSerial>, TimestampParseError> {
    let Some(tlv) = r.read_optional(Tag::Sequence)? else {
        return Ok(None);
    };
    let mut s = tlv.reader()?;
    let issuer = s.read_expected(Tag::Sequence, "GeneralNames")?.raw().to_vec();
    let serial_number = s.read_expected(Tag::Integer, "serialNumber")?.integer_bytes()?.to_vec();
    Ok(Some(IssuerSerial {
        issuer,
        serial_number,
    }))
}

/// `OtherHash`: a bare SHA-1 value or an algorithm/value pair.
fn decode_other_hash(tlv: &Element<'_>) -> Result<(DigestAlgorithm, Vec<u8>), TimestampParseError> {
    if tlv.is_universal(Tag::Sequence) {
        let mut r = tlv.reader()?;
        let alg = decode_digest_algorithm(&r.read()?)?;
        let value = r.read_expected(Tag::OctetString, "hashValue")?.octets()?.into_owned();
        return Ok((alg, value));
    }
    let value = tlv.expect(Tag::OctetString, "OtherHash")?.octets()?.into_owned();
    Ok((DigestAlgorithm::Sha1, value))
}

fn decode_unsigned_attributes(attrs: &Element<'_>) -> Result<UnsignedAttributes, TimestampParseError> {
    let mut out = UnsignedAttributes::default();
    for attribute in attrs.children()? {
        let (attr_type, value) = decode_attribute(&attribute)?;
        match attr_type.as_str() {
            oid::ATTR_CERT_VALUES => {
                for cert in value.expect(Tag::Sequence, "CertificateValues")?.children()? {
                    push_unique(&mut out.cert_values, CertificateToken::from_der(cert.raw())?);
                }
            }
            oid::ATTR_COMPLETE_CERTIFICATE_REFS => {
                for other in value.expect(Tag::Sequence, "CompleteCertificateRefs")?.children()? {
                    let mut r = other.expect(Tag::Sequence, "OtherCertID")?.reader()?;
                    let (digest_algorithm, digest) = decode_other_hash(&r.read()?)?;
                    let issuer_serial = decode_optional_issuer_serial(&mut r)?;
                    out.complete_certificate_refs.push(CertificateRef {
                        origin: CertificateRefOrigin::CompleteCertificateRefs,
                        digest_algorithm,
                        digest,
                        issuer_serial,
                    });
                }
            }
            oid::ATTR_REVOCATION_VALUES => decode_revocation_values(&value, &mut out)?,
            oid::ATTR_COMPLETE_REVOCATION_REFS => decode_revocation_refs(&value, &mut out)?,
            _ => {}
        }
    }
    Ok(out)
}

fn decode_revocation_values(value: &Element<'_>, out: &mut UnsignedAttributes) -> Result<(), TimestampParseError> {
    let mut r = value.expect(Tag::Sequence, "RevocationValues")?.reader()?;
    if let Some(crl_vals) = r.read_context(0)? {
        for seq in crl_vals.children()? {
            for crl in seq.expect(Tag::Sequence, "crlVals")?.children()? {
                out.crl_values.push(crl.raw().to_vec());
            }
        }
    }
    if let Some(ocsp_vals) = r.read_context(1)? {
        for seq in ocsp_vals.children()? {
            for ocsp in seq.expect(Tag::Sequence, "ocspVals")?.children()? {
                out.ocsp_values.push(ocsp.raw().to_vec());
            }
        }
    }
    Ok(())
}

fn decode_revocation_refs(value: &Element<'_>, out: &mut UnsignedAttributes) -> Result<(), TimestampParseError> {
    for crl_ocsp_ref in value.expect(Tag::Sequence, "CompleteRevocationRefs")?.children()? {
        let mut r = crl_ocsp_ref.expect(Tag::Sequence, "CrlOcspRef")?.reader()?;
        if let Some(crlids) = r.read_context(0)? {
            for list_id in crlids.children()? {
                for crls in list_id.expect(Tag::Sequence, "CRLListID")?.children()? {
                    for validated in crls.expect(Tag::Sequence, "crls")?.children()? {
                        out.crl_refs.push(decode_crl_validated_id(&validated)?);
                    }
                }
            }
        }
        if let Some(ocspids) = r.read_context(1)? {
            for list_id in ocspids.children()? {
                for responses in list_id.expect(Tag::Sequence, "OcspListID")?.children()? {
                    for response in responses.expect(Tag::Sequence, "ocspResponses")?.children()? {
                        out.ocsp_refs.push(decode_ocsp_responses_id(&response)?);
                    }
                }
            }
        }
    }
    Ok(())
}

fn decode_crl_validated_id(tlv: &Element<'_>) -> Result<CrlRef, TimestampParseError> {
    let mut r = tlv.expect(Tag::Sequence, "CrlValidatedID")?.reader()?;
    let (digest_algorithm, digest) = decode_other_hash(&r.read()?)?;
    let mut reference = CrlRef {
        digest_algorithm,
        digest,
        issuer: None,
        issued_time: None,
        crl_number: None,
    };
    if let Some(identifier) = r.read_optional(Tag::Sequence)? {
        let mut i = identifier.reader()?;
        reference.issuer = Some(i.read_expected(Tag::Sequence, "crlissuer")?.raw().to_vec());
        reference.issued_time = Some(i.read()?.time()?);
        if let Some(number) = i.read_optional(Tag::Integer)? {
            reference.crl_number = Some(number.integer_bytes()?.to_vec());
        }
    }
    Ok(reference)
}

fn decode_ocsp_responses_id(tlv: &Element<'_>) -> Result<OcspRef, TimestampParseError> {
    let mut r = tlv.expect(Tag::Sequence, "OcspResponsesID")?.reader()?;
    let mut identifier = r.read_expected(Tag::Sequence, "OcspIdentifier")?.reader()?;
    let responder = identifier.read()?;
    let responder_id = if responder.is_context(1) {
        let mut n = responder.reader()?;
        ResponderId::ByName(n.read_expected(Tag::Sequence, "byName")?.raw().to_vec())
    } else if responder.is_context(2) {
        let mut k = responder.reader()?;
        ResponderId::ByKey(k.read_expected(Tag::OctetString, "byKey")?.octets()?.into_owned())
    } else {
        return Err(TimestampParseError::invalid("ocspResponderID", "unknown responder id form"));
    };
    let produced_at = identifier.read()?.time()?;
    let digest = match r.is_empty() {
        true => None,
        false => Some(decode_other_hash(&r.read()?)?),
    };
    Ok(OcspRef {
        responder_id,
        produced_at,
        digest,
    })
}

fn decode_tst_info(encoded: &[u8]) -> Result<TstInfo, TimestampParseError> {
    let tst = parse_single(encoded, "TSTInfo")?.expect(Tag::Sequence, "TSTInfo")?;
    let mut r = tst.reader()?;
    let version = r.read_expected(Tag::Integer, "TSTInfo.version")?.small_unsigned()?;
    if version != 1 {
        return Err(TimestampParseError::invalid("TSTInfo.version", format!("unsupported version {version}")));
    }
    let policy = r.read_expected(Tag::Oid, "policy")?.oid()?;

    let mut mi = r.read_expected(Tag::Sequence, "messageImprint")?.reader()?;
    let algorithm = decode_digest_algorithm(&mi.read()?)?;
    let digest = mi.read_expected(Tag::OctetString, "hashedMessage")?.octets()?.into_owned();
    mi.finish("messageImprint")?;
    if digest.len() != algorithm.output_len() {
        return Err(TimestampParseError::invalid(
            "hashedMessage",
            format!("{} bytes for {algorithm}", digest.len()),
        ));
    }

    let serial_number = r.read_expected(Tag::Integer, "serialNumber")?.integer_bytes()?.to_vec();
    let generation_time = r.read()?.time()?;

    let accuracy = match r.read_optional(Tag::Sequence)? {
        Some(tlv) => Some(decode_accuracy(&tlv)?),
        None => None,
    };
    let ordering = match r.read_optional(Tag::Boolean)? {
        Some(tlv) => tlv.boolean()?,
        None => false,
    };
    let nonce = match r.read_optional(Tag::Integer)? {
        Some(tlv) => Some(tlv.integer_bytes()?.to_vec()),
        None => None,
    };
    let tsa_name = match r.read_context(0)? {
        Some(tlv) => tlv.children()?.first().map(|name| name.raw().to_vec()),
        None => None,
    };
    r.read_context(1)?;
    r.finish("TSTInfo")?;

    Ok(TstInfo {
        version,
        policy,
        message_imprint: MessageImprint { algorithm, digest },
        serial_number,
        generation_time,
        accuracy,
        ordering,
        nonce,
        tsa_name,
    })
}

fn decode_accuracy(tlv: &Element<'_>) -> Result<Accuracy, TimestampParseError> {
    let mut accuracy = Accuracy::default();
    for field in tlv.children()? {
        if field.is_universal(Tag::Integer) {
            accuracy.seconds = field.small_unsigned()?;
        } else if field.is_context(0) && !field.is_constructed() {
            accuracy.millis = field.small_unsigned()?;
        } else if field.is_context(1) && !field.is_constructed() {
            accuracy.micros = field.small_unsigned()?;
        } else {
            return Err(TimestampParseError::invalid("accuracy", "unknown field"));
        }
    }
    Ok(accuracy)
}
