// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded BER navigation for CMS structures.
//!
//! Timestamp tokens arrive from untrusted sources and are frequently BER
//! encoded (indefinite lengths, constructed OCTET STRINGs). Elements are framed
//! by `der_parser`'s BER parser, which checks every declared length against
//! the remaining input and bounds indefinite-length recursion. This module
//! adds what CMS decoding needs on top of it:
//! - the raw encoding of each element (certificates, names, signed attributes)
//! - a nesting cap of [`MAX_DEPTH`] levels, enforced on every descent
//! - typed accessors mapped onto [`BerError`]

use std::borrow::Cow;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use der_parser::asn1_rs::{ASN1TimeZone, Any, Class, Header, Length, Tag, ToDer};
use der_parser::ber::parse_ber_any;
use der_parser::error::BerError as Asn1Error;
use der_parser::nom;
use thiserror::Error;

/// Maximum nesting depth accepted by the reader.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BerError {
    #[error("input truncated")]
    Truncated,
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    DepthExceeded,
    #[error("expected {0}")]
    UnexpectedTag(&'static str),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("trailing data after {0}")]
    TrailingData(&'static str),
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid time value")]
    InvalidTime,
    #[error("cannot re-encode {0}")]
    Reencode(&'static str),
    #[error("{0}")]
    Asn1(Asn1Error),
}

impl From<Asn1Error> for BerError {
    fn from(error: Asn1Error) -> Self {
        match error {
            Asn1Error::BerMaxDepth => Self::DepthExceeded,
            Asn1Error::Incomplete(_) => Self::Truncated,
            other => Self::Asn1(other),
        }
    }
}

impl From<nom::Err<Asn1Error>> for BerError {
    fn from(error: nom::Err<Asn1Error>) -> Self {
        match error {
            nom::Err::Incomplete(_) => Self::Truncated,
            nom::Err::Error(e) | nom::Err::Failure(e) => e.into(),
        }
    }
}

/// One decoded element borrowing from the input.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    any: Any<'a>,
    raw: &'a [u8],
    depth: usize,
}

impl<'a> Element<'a> {
    pub fn tag(&self) -> Tag {
        self.any.tag()
    }

    pub fn class(&self) -> Class {
        self.any.class()
    }

    pub fn is_constructed(&self) -> bool {
        self.any.header.is_constructed()
    }

    /// Universal class element carrying `tag`.
    pub fn is_universal(&self, tag: Tag) -> bool {
        self.class() == Class::Universal && self.tag() == tag
    }

    /// Context-specific `[n]`, either form.
    pub fn is_context(&self, n: u32) -> bool {
        self.class() == Class::ContextSpecific && self.tag() == Tag(n)
    }

    /// Full encoding of the element, header (and end-of-contents) included.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Content octets. For indefinite lengths the end-of-contents marker is excluded.
    pub fn content(&self) -> &'a [u8] {
        self.any.data
    }

    /// Fails with `UnexpectedTag` unless the element is universal `tag`.
    pub fn expect(&self, tag: Tag, what: &'static str) -> Result<Self, BerError> {
        match self.is_universal(tag) {
            true => Ok(self.clone()),
            false => Err(BerError::UnexpectedTag(what)),
        }
    }

    /// Reader over the children of a constructed element.
    pub fn reader(&self) -> Result<Reader<'a>, BerError> {
        if !self.is_constructed() {
            return Err(Asn1Error::ConstructExpected.into());
        }
        let depth = self.depth + 1;
        if depth > MAX_DEPTH {
            return Err(BerError::DepthExceeded);
        }
        Ok(Reader {
            input: self.any.data,
            depth,
        })
    }

    /// Collects every child element.
    pub fn children(&self) -> Result<Vec<Element<'a>>, BerError> {
        let mut reader = self.reader()?;
        let mut out = Vec::new();
        while !reader.is_empty() {
            out.push(reader.read()?);
        }
        Ok(out)
    }

    /// Walks the whole subtree so malformed nesting is reported up front.
    fn validate(&self) -> Result<(), BerError> {
        if !self.is_constructed() {
            return Ok(());
        }
        for child in self.children()? {
            child.validate()?;
        }
        Ok(())
    }

    /// DER `SET` header over the same content octets.
    ///
    /// Signed attributes are carried as `[0] IMPLICIT` but signed as `SET OF`.
    pub fn as_set_encoding(&self) -> Result<Vec<u8>, BerError> {
        let header = Header::new(
            Class::Universal,
            true,
            Tag::Set,
            Length::Definite(self.any.data.len()),
        );
        let mut out = header
            .to_der_vec()
            .map_err(|_| BerError::Reencode("SET header"))?;
        out.extend_from_slice(self.any.data);
        Ok(out)
    }

    /// OCTET STRING value; constructed (BER) strings are concatenated.
    pub fn octets(&self) -> Result<Cow<'a, [u8]>, BerError> {
        if !self.is_constructed() {
            return Ok(Cow::Borrowed(self.any.data));
        }
        let mut out = Vec::new();
        self.collect_segments(&mut out)?;
        Ok(Cow::Owned(out))
    }

    fn collect_segments(&self, out: &mut Vec<u8>) -> Result<(), BerError> {
        for segment in self.children()? {
            let segment = segment.expect(Tag::OctetString, "OCTET STRING segment")?;
            match segment.is_constructed() {
                true => segment.collect_segments(out)?,
                false => out.extend_from_slice(segment.any.data),
            }
        }
        Ok(())
    }

    /// Dotted-decimal object identifier.
    pub fn oid(&self) -> Result<String, BerError> {
        Ok(self.any.as_oid()?.to_id_string())
    }

    /// INTEGER content with redundant leading zero octets removed.
    pub fn integer_bytes(&self) -> Result<&'a [u8], BerError> {
        if self.any.data.is_empty() {
            return Err(BerError::InvalidInteger);
        }
        Ok(strip_leading_zeros(self.any.data))
    }

    /// Small non-negative INTEGER (versions, counters), also under an implicit tag.
    pub fn small_unsigned(&self) -> Result<u64, BerError> {
        let any = self
            .any
            .clone()
            .with_class(Class::Universal)
            .with_tag(Tag::Integer);
        any.as_u64().map_err(|_| BerError::InvalidInteger)
    }

    pub fn boolean(&self) -> Result<bool, BerError> {
        Ok(self.any.as_bool()?)
    }

    /// `GeneralizedTime` or `UTCTime`.
    pub fn time(&self) -> Result<DateTime<Utc>, BerError> {
        if self.is_universal(Tag::GeneralizedTime) {
            return generalized_time(self.any.data);
        }
        if self.is_universal(Tag::UtcTime) {
            let time = self.any.as_utctime()?.0;
            // Two-digit years below 50 belong to the 21st century.
            let year = match time.year {
                yy if yy < 50 => 2000 + yy,
                yy => 1900 + yy,
            };
            let date = NaiveDate::from_ymd_opt(
                i32::try_from(year).map_err(|_| BerError::InvalidTime)?,
                u32::from(time.month),
                u32::from(time.day),
            )
            .ok_or(BerError::InvalidTime)?;
            let local = date
                .and_hms_opt(
                    u32::from(time.hour),
                    u32::from(time.minute),
                    u32::from(time.second),
                )
                .ok_or(BerError::InvalidTime)?;
            let utc = match time.tz {
                ASN1TimeZone::Z => local,
                ASN1TimeZone::Offset(h, m) => {
                    let minutes = i64::from(h.signum()) * i64::from(m);
                    local - (Duration::hours(i64::from(h)) + Duration::minutes(minutes))
                }
                ASN1TimeZone::Undefined => return Err(BerError::InvalidTime),
            };
            return Ok(utc.and_utc());
        }
        Err(BerError::UnexpectedTag("GeneralizedTime or UTCTime"))
    }
}

/// `YYYYMMDDHHMMSS[.f*]Z`; the fraction keeps its full precision.
fn generalized_time(content: &[u8]) -> Result<DateTime<Utc>, BerError> {
    let text = std::str::from_utf8(content).map_err(|_| BerError::InvalidTime)?;
    let text = text.strip_suffix('Z').ok_or(BerError::InvalidTime)?;
    NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S%.f")
        .map(|t| t.and_utc())
        .map_err(|_| BerError::InvalidTime)
}

/// Sequential reader over consecutive elements.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a [u8],
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Reads the next element.
    pub fn read(&mut self) -> Result<Element<'a>, BerError> {
        let (rest, any) = parse_ber_any(self.input)?;
        let raw = &self.input[..self.input.len() - rest.len()];
        self.input = rest;
        Ok(Element {
            any,
            raw,
            depth: self.depth,
        })
    }

    /// Reads the next element and checks it is universal `tag`.
    pub fn read_expected(&mut self, tag: Tag, what: &'static str) -> Result<Element<'a>, BerError> {
        if self.is_empty() {
            return Err(BerError::Missing(what));
        }
        self.read()?.expect(tag, what)
    }

    /// Reads the next element only when `accept` holds for it.
    pub fn read_if(
        &mut self,
        accept: impl FnOnce(&Element<'a>) -> bool,
    ) -> Result<Option<Element<'a>>, BerError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut lookahead = self.clone();
        let element = lookahead.read()?;
        if !accept(&element) {
            return Ok(None);
        }
        *self = lookahead;
        Ok(Some(element))
    }

    /// Reads the next element when it is universal `tag`.
    pub fn read_optional(&mut self, tag: Tag) -> Result<Option<Element<'a>>, BerError> {
        self.read_if(|e| e.is_universal(tag))
    }

    /// Reads the next element when it is context-specific `[n]`.
    pub fn read_context(&mut self, n: u32) -> Result<Option<Element<'a>>, BerError> {
        self.read_if(|e| e.is_context(n))
    }

    /// Fails when unread elements remain.
    pub fn finish(&self, what: &'static str) -> Result<(), BerError> {
        match self.is_empty() {
            true => Ok(()),
            false => Err(BerError::TrailingData(what)),
        }
    }
}

/// Decodes exactly one element spanning the whole input and validates its subtree.
pub fn parse_single<'a>(input: &'a [u8], what: &'static str) -> Result<Element<'a>, BerError> {
    let mut reader = Reader { input, depth: 0 };
    if reader.is_empty() {
        return Err(BerError::Missing(what));
    }
    let element = reader.read()?;
    reader.finish(what)?;
    element.validate()?;
    Ok(element)
}

pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take(bytes.len().saturating_sub(1))
        .take_while(|b| **b == 0)
        .count();
    &bytes[skip..]
}
