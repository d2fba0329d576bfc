// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! DER builders for assembling CMS test structures.
//!
//! Encoding goes through the `der` crate. Only the BER-specific forms
//! (indefinite lengths, constructed OCTET STRINGs) are framed by hand since
//! DER cannot express them.

use ::der::asn1::{AnyRef, Null, ObjectIdentifier, OctetStringRef, SetOfVec, UintRef};
use ::der::{Decode, Encode, Tag, TagNumber, Tagged};

pub fn tlv(tag: Tag, content: &[u8]) -> Vec<u8> {
    AnyRef::new(tag, content)
        .and_then(|any| any.to_der())
        .expect("DER element")
}

/// BER indefinite-length form, terminated by end-of-contents.
pub fn indefinite(identifier: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![identifier, 0x80];
    out.extend_from_slice(content);
    out.extend_from_slice(&[0, 0]);
    out
}

pub fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(Tag::Sequence, &parts.concat())
}

/// `SET OF` with its elements in DER order.
pub fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    let elements: Vec<AnyRef<'_>> = parts
        .iter()
        .map(|part| AnyRef::from_der(part).expect("DER set element"))
        .collect();
    SetOfVec::try_from(elements)
        .and_then(|set| set.to_der())
        .expect("DER SET OF")
}

fn context_tag(n: u8, constructed: bool) -> Tag {
    Tag::ContextSpecific {
        constructed,
        number: TagNumber::new(n),
    }
}

/// `[n]` constructed.
pub fn context(n: u8, parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(context_tag(n, true), &parts.concat())
}

/// `[n]` primitive.
pub fn context_primitive(n: u8, content: &[u8]) -> Vec<u8> {
    tlv(context_tag(n, false), content)
}

/// Re-tags an encoded element as `[n] IMPLICIT`, keeping its form.
pub fn implicit(n: u8, encoded: &[u8]) -> Vec<u8> {
    let any = AnyRef::from_der(encoded).expect("DER element");
    tlv(context_tag(n, any.tag().is_constructed()), any.value())
}

pub fn octet_string(content: &[u8]) -> Vec<u8> {
    OctetStringRef::new(content)
        .and_then(|octets| octets.to_der())
        .expect("DER OCTET STRING")
}

/// Constructed OCTET STRING split into `chunk` sized primitive segments.
pub fn chunked_octet_string(content: &[u8], chunk: usize) -> Vec<u8> {
    let segments: Vec<u8> = content
        .chunks(chunk.max(1))
        .flat_map(octet_string)
        .collect();
    indefinite(0x24, &segments)
}

pub fn null() -> Vec<u8> {
    Null.to_der().expect("DER NULL")
}

pub fn boolean(value: bool) -> Vec<u8> {
    value.to_der().expect("DER BOOLEAN")
}

/// INTEGER from unsigned big-endian magnitude bytes.
pub fn integer(magnitude: &[u8]) -> Vec<u8> {
    UintRef::new(magnitude)
        .and_then(|uint| uint.to_der())
        .expect("DER INTEGER")
}

pub fn small_integer(value: u64) -> Vec<u8> {
    value.to_der().expect("DER INTEGER")
}

pub fn oid(dotted: &str) -> Vec<u8> {
    ObjectIdentifier::new(dotted)
        .expect("dotted OID")
        .to_der()
        .expect("DER OBJECT IDENTIFIER")
}

/// `GeneralizedTime` taken verbatim, e.g. `20240102030405.250Z`.
///
/// Fractional seconds are legal in timestamp tokens but not in `der`'s
/// `GeneralizedTime`, so the text is wrapped as-is.
pub fn generalized_time(value: &str) -> Vec<u8> {
    tlv(Tag::GeneralizedTime, value.as_bytes())
}

pub fn algorithm_identifier(algorithm: &str, with_null_parameters: bool) -> Vec<u8> {
    match with_null_parameters {
        true => sequence(&[oid(algorithm), null()]),
        false => sequence(&[oid(algorithm)]),
    }
}

/// CMS `Attribute` with a single value.
pub fn attribute(attr_type: &str, value: Vec<u8>) -> Vec<u8> {
    sequence(&[oid(attr_type), set(&[value])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_oids_and_integers() {
        assert_eq!(oid("1.2.840.113549"), vec![0x06, 0x06, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]);
        assert_eq!(integer(&[0x80]), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(integer(&[0x00, 0x00, 0x05]), vec![0x02, 0x01, 0x05]);
        assert_eq!(small_integer(0), vec![0x02, 0x01, 0x00]);
    }

    #[test]
    fn long_form_lengths() {
        let encoded = octet_string(&[0u8; 300]);
        assert_eq!(&encoded[..4], &[0x04, 0x82, 0x01, 0x2c]);
        assert_eq!(encoded.len(), 304);
    }

    #[test]
    fn set_elements_are_sorted_and_retagged() {
        let encoded = set(&[small_integer(5), small_integer(2)]);
        assert_eq!(encoded, vec![0x31, 0x06, 0x02, 0x01, 0x02, 0x02, 0x01, 0x05]);
        assert_eq!(implicit(0, &encoded)[0], 0xa0);
        assert_eq!(&implicit(0, &encoded)[1..], &encoded[1..]);
    }
}
