//! Minimal DER codec.
//!
//! Key material moves through kagi as DER bytes. This crate parses those bytes
//! into a [`Tlv`] tree (constructed values are parsed recursively) and writes
//! a tree back out with definite, minimal lengths so that a parse/encode cycle
//! reproduces the input byte for byte.

use kagi::decoder::{DecodableFrom, Decoder};
use kagi::encoder::{EncodableTo, Encoder};
use nom::{IResult, Parser};

pub mod error;
mod oid;

pub use error::{Error, Result};
pub use oid::ObjectIdentifier;

const CONTEXT_CONSTRUCTED: u8 = 0xa0;
const CONTEXT_PRIMITIVE: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tag {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    UTF8String,
    Sequence,
    Set,
    PrintableString,
    IA5String,
    /// `[n]` with the constructed bit set (EXPLICIT tagging)
    ContextConstructed(u8),
    /// `[n]` primitive (IMPLICIT tagging)
    ContextPrimitive(u8),
    Unimplemented(u8),
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Boolean,
            0x02 => Self::Integer,
            0x03 => Self::BitString,
            0x04 => Self::OctetString,
            0x05 => Self::Null,
            0x06 => Self::ObjectIdentifier,
            0x0c => Self::UTF8String,
            0x30 => Self::Sequence,
            0x31 => Self::Set,
            0x13 => Self::PrintableString,
            0x16 => Self::IA5String,
            v if v & 0xe0 == CONTEXT_CONSTRUCTED => Self::ContextConstructed(v & 0x1f),
            v if v & 0xe0 == CONTEXT_PRIMITIVE => Self::ContextPrimitive(v & 0x1f),
            _ => Tag::Unimplemented(value),
        }
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Boolean => 0x01,
            Tag::Integer => 0x02,
            Tag::BitString => 0x03,
            Tag::OctetString => 0x04,
            Tag::Null => 0x05,
            Tag::ObjectIdentifier => 0x06,
            Tag::UTF8String => 0x0c,
            Tag::Sequence => 0x30,
            Tag::Set => 0x31,
            Tag::PrintableString => 0x13,
            Tag::IA5String => 0x16,
            Tag::ContextConstructed(n) => CONTEXT_CONSTRUCTED | n,
            Tag::ContextPrimitive(n) => CONTEXT_PRIMITIVE | n,
            Tag::Unimplemented(v) => v,
        }
    }
}

impl Tag {
    fn is_constructed(&self) -> bool {
        matches!(self, Tag::Sequence | Tag::Set | Tag::ContextConstructed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Tlv(Vec<Tlv>),
    Data(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Value,
}

impl Tlv {
    pub fn new_primitive(tag: Tag, data: Vec<u8>) -> Self {
        Tlv {
            tag,
            value: Value::Data(data),
        }
    }

    pub fn new_constructed(tag: Tag, children: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            value: Value::Tlv(children),
        }
    }

    pub fn sequence(children: Vec<Tlv>) -> Self {
        Self::new_constructed(Tag::Sequence, children)
    }

    pub fn null() -> Self {
        Self::new_primitive(Tag::Null, vec![])
    }

    pub fn octet_string(data: &[u8]) -> Self {
        Self::new_primitive(Tag::OctetString, data.to_vec())
    }

    /// BIT STRING with zero unused bits.
    pub fn bit_string(data: &[u8]) -> Self {
        let mut content = Vec::with_capacity(data.len() + 1);
        content.push(0);
        content.extend_from_slice(data);
        Self::new_primitive(Tag::BitString, content)
    }

    pub fn oid(oid: &ObjectIdentifier) -> Self {
        Self::new_primitive(Tag::ObjectIdentifier, oid.to_der_bytes())
    }

    pub fn small_integer(value: u64) -> Self {
        Self::unsigned_integer(&value.to_be_bytes())
    }

    /// Non-negative INTEGER from big-endian magnitude bytes.
    pub fn unsigned_integer(magnitude: &[u8]) -> Self {
        let start = magnitude
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(magnitude.len().saturating_sub(1));
        let trimmed = if magnitude.is_empty() {
            &[0u8][..]
        } else {
            &magnitude[start..]
        };
        let mut data = Vec::with_capacity(trimmed.len() + 1);
        if trimmed[0] & 0x80 != 0 {
            data.push(0);
        }
        data.extend_from_slice(trimmed);
        Self::new_primitive(Tag::Integer, data)
    }

    pub fn context(slot: u8, inner: Tlv) -> Self {
        Self::new_constructed(Tag::ContextConstructed(slot), vec![inner])
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn children(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Tlv(children) => Some(children),
            Value::Data(_) => None,
        }
    }

    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(data) => Some(data),
            Value::Tlv(_) => None,
        }
    }

    /// Children of a SEQUENCE.
    pub fn expect_sequence(&self) -> Result<&[Tlv]> {
        match (&self.tag, &self.value) {
            (Tag::Sequence, Value::Tlv(children)) => Ok(children),
            _ => Err(Error::UnexpectedTag {
                expected: "SEQUENCE",
            }),
        }
    }

    pub fn expect_oid(&self) -> Result<ObjectIdentifier> {
        match (&self.tag, &self.value) {
            (Tag::ObjectIdentifier, Value::Data(data)) => ObjectIdentifier::try_from(&data[..]),
            _ => Err(Error::UnexpectedTag {
                expected: "OBJECT IDENTIFIER",
            }),
        }
    }

    pub fn expect_octet_string(&self) -> Result<&[u8]> {
        match (&self.tag, &self.value) {
            (Tag::OctetString, Value::Data(data)) => Ok(data),
            _ => Err(Error::UnexpectedTag {
                expected: "OCTET STRING",
            }),
        }
    }

    /// Content bytes of a BIT STRING with the unused-bits octet removed.
    pub fn expect_bit_string(&self) -> Result<&[u8]> {
        match (&self.tag, &self.value) {
            (Tag::BitString, Value::Data(data)) if !data.is_empty() => Ok(&data[1..]),
            _ => Err(Error::UnexpectedTag {
                expected: "BIT STRING",
            }),
        }
    }

    /// Magnitude of a non-negative INTEGER, without the sign octet.
    pub fn expect_unsigned_integer(&self) -> Result<&[u8]> {
        match (&self.tag, &self.value) {
            (Tag::Integer, Value::Data(data)) if !data.is_empty() => {
                if data.len() > 1 && data[0] == 0 {
                    Ok(&data[1..])
                } else {
                    Ok(data)
                }
            }
            _ => Err(Error::UnexpectedTag { expected: "INTEGER" }),
        }
    }

    pub fn expect_small_integer(&self) -> Result<u64> {
        let magnitude = self.expect_unsigned_integer()?;
        if magnitude.len() > 8 {
            return Err(Error::UnexpectedTag {
                expected: "INTEGER fitting in 64 bits",
            });
        }
        Ok(magnitude.iter().fold(0u64, |n, b| (n << 8) | *b as u64))
    }

    /// Parses exactly one TLV; trailing bytes are an error.
    pub fn from_der(input: &[u8]) -> Result<Tlv> {
        let (rest, tlv) = Self::parse(input)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(rest.len()));
        }
        Ok(tlv)
    }

    pub fn to_der(&self) -> Vec<u8> {
        let content = match &self.value {
            Value::Data(data) => data.clone(),
            Value::Tlv(children) => children.iter().flat_map(Tlv::to_der).collect(),
        };
        let mut out = Vec::with_capacity(content.len() + 6);
        out.push(u8::from(self.tag));
        out.extend(encode_length(content.len()));
        out.extend(content);
        out
    }

    fn parse(input: &[u8]) -> IResult<&[u8], Tlv> {
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = nom::bytes::complete::take(length).parse(input)?;

        if tag.is_constructed() {
            // parse TLV recursively.
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (new_input, v) = Self::parse(data)?;
                data = new_input;
                tlvs.push(v);
            }

            return Ok((input, Tlv::new_constructed(tag, tlvs)));
        }

        Ok((input, Tlv::new_primitive(tag, data.to_vec())))
    }
}

fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag> {
    let (input, n) = nom::number::be_u8().parse(input)?;
    Ok((input, Tag::from(n)))
}

fn parse_length(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, n) = nom::number::be_u8().parse(input)?;
    if n & 0x80 == 0x80 {
        // long form
        // First 1 bit is a marker for long form.
        // Other bits represent bytes length of the length field.
        let length = n & 0x7f;
        let (input, bs) = nom::bytes::complete::take(length).parse(input)?;
        let n = bs.iter().fold(0u64, |n, &b| (n << 8) | b as u64);
        return Ok((input, n));
    }
    // short form: 0-127
    Ok((input, n as u64))
}

fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let bytes = length.to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let mut out = vec![0x80 | (bytes.len() - start) as u8];
    out.extend_from_slice(&bytes[start..]);
    out
}

impl DecodableFrom<Vec<u8>> for Tlv {}

impl Decoder<Vec<u8>, Tlv> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Tlv> {
        Tlv::from_der(self)
    }
}

impl DecodableFrom<&[u8]> for Tlv {}

impl Decoder<&[u8], Tlv> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Tlv> {
        Tlv::from_der(self)
    }
}

impl EncodableTo<Tlv> for Vec<u8> {}

impl Encoder<Tlv, Vec<u8>> for Tlv {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_der())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{Error, Tag, Tlv, Value, encode_length, parse_length, parse_tag};

    #[rstest(input, expected,
        case(vec![0x02], Tag::Integer),
        case(vec![0x02, 0x01], Tag::Integer),
        case(vec![0x30, 0x01], Tag::Sequence),
        case(vec![0xa0], Tag::ContextConstructed(0)),
        case(vec![0xa1], Tag::ContextConstructed(1)),
        case(vec![0x81], Tag::ContextPrimitive(1)),
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let actual = parse_tag(&input).unwrap();

        assert_eq!(expected, actual.1);
    }

    #[rstest(input, expected,
        case(vec![0x02], 0x02),
        case(vec![0x30, 0x01], 0x30),
        case(vec![0x82, 0x02, 0x10], 256 * 0x02 + 0x10),
        case(vec![0x83, 0x01, 0x00, 0x00], 256 * 256),
        case(vec![0x82, 0xff, 0xff], 256 * 0xff + 0xff),
    )]
    fn test_parse_length(input: Vec<u8>, expected: u64) {
        let actual = parse_length(&input).unwrap();

        assert_eq!(expected, actual.1);
    }

    #[rstest(length, expected,
        case(0, vec![0x00]),
        case(127, vec![0x7f]),
        case(128, vec![0x81, 0x80]),
        case(256 * 0x02 + 0x10, vec![0x82, 0x02, 0x10]),
        case(256 * 256, vec![0x83, 0x01, 0x00, 0x00]),
    )]
    fn test_encode_length(length: usize, expected: Vec<u8>) {
        assert_eq!(expected, encode_length(length));
    }

    #[rstest(input, expected,
        case(vec![0x02, 0x01, 0x01], Tlv::new_primitive(Tag::Integer, vec![0x01])),
        case(vec![0x05, 0x00], Tlv::null()),
        case(vec![0x04, 0x04, 0x03, 0x02, 0x06, 0xa0], Tlv::octet_string(&[0x03, 0x02, 0x06, 0xa0])),
        case(vec![0x03, 0x04, 0x00, 0x6e, 0x5d, 0xc0], Tlv::bit_string(&[0x6e, 0x5d, 0xc0])),
        case(vec![0x30, 0x06, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08], Tlv::sequence(vec![
            Tlv::new_primitive(Tag::Integer, vec![0x07]),
            Tlv::new_primitive(Tag::Integer, vec![0x08]),
        ])),
        case(vec![0xa0, 0x03, 0x02, 0x01, 0x09], Tlv::context(0, Tlv::new_primitive(Tag::Integer, vec![0x09]))),
    )]
    fn test_tlv_round_trip(input: Vec<u8>, expected: Tlv) {
        let actual = Tlv::from_der(&input).unwrap();
        assert_eq!(expected, actual);
        assert_eq!(input, actual.to_der());
    }

    #[test]
    fn test_long_form_round_trip() {
        let payload = vec![0xab; 300];
        let tlv = Tlv::octet_string(&payload);
        let der = tlv.to_der();
        assert_eq!(&der[..4], &[0x04, 0x82, 0x01, 0x2c]);
        assert_eq!(Tlv::from_der(&der).unwrap(), tlv);
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        let err = Tlv::from_der(&[0x05, 0x00, 0x00]).unwrap_err();
        assert_eq!(Error::TrailingData(1), err);
    }

    #[rstest(magnitude, expected,
        case(vec![0x01], vec![0x01]),
        case(vec![0x80], vec![0x00, 0x80]),
        case(vec![0x00, 0x00, 0x7f], vec![0x7f]),
        case(vec![0x00], vec![0x00]),
    )]
    fn test_unsigned_integer(magnitude: Vec<u8>, expected: Vec<u8>) {
        let tlv = Tlv::unsigned_integer(&magnitude);
        match tlv.value() {
            Value::Data(data) => assert_eq!(&expected, data),
            Value::Tlv(_) => panic!("INTEGER must be primitive"),
        }
        let back = tlv.expect_unsigned_integer().unwrap();
        assert_eq!(back, &expected[expected.len() - back.len()..]);
    }

    #[test]
    fn test_small_integer() {
        assert_eq!(Tlv::small_integer(2048).expect_small_integer().unwrap(), 2048);
        assert_eq!(Tlv::small_integer(0).expect_small_integer().unwrap(), 0);
    }

    #[test]
    fn test_expect_mismatch() {
        let tlv = Tlv::null();
        assert!(tlv.expect_sequence().is_err());
        assert!(tlv.expect_oid().is_err());
        assert!(tlv.expect_octet_string().is_err());
    }
}
