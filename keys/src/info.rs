//! PKCS#8 and X.509 key containers over the DER TLV tree.
//!
//! ref: https://www.rfc-editor.org/rfc/rfc5958 and https://www.rfc-editor.org/rfc/rfc5280#section-4.1

use std::str::FromStr;

use kagi::decoder::{DecodableFrom, Decoder};
use kagi_der::{ObjectIdentifier, Tag, Tlv};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AlgorithmIdentifier {
    pub(crate) oid: ObjectIdentifier,
    pub(crate) parameters: Option<Tlv>,
}

impl AlgorithmIdentifier {
    pub(crate) fn new(oid: &str, parameters: Option<Tlv>) -> Result<Self> {
        Ok(AlgorithmIdentifier {
            oid: ObjectIdentifier::from_str(oid)?,
            parameters,
        })
    }

    pub(crate) fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let children = tlv.expect_sequence()?;
        let oid = children
            .first()
            .ok_or_else(|| Error::argument("empty AlgorithmIdentifier"))?
            .expect_oid()?;
        let parameters = children.get(1).filter(|p| p.tag() != Tag::Null).cloned();
        Ok(AlgorithmIdentifier { oid, parameters })
    }

    pub(crate) fn to_tlv(&self) -> Tlv {
        let mut children = vec![Tlv::oid(&self.oid)];
        if let Some(parameters) = &self.parameters {
            children.push(parameters.clone());
        }
        Tlv::sequence(children)
    }

    pub(crate) fn expect_parameters(&self) -> Result<&Tlv> {
        self.parameters
            .as_ref()
            .ok_or_else(|| Error::argument(format!("algorithm {} carries no parameters", self.oid)))
    }
}

/// `PrivateKeyInfo` (version 0); attributes are not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrivateKeyInfo {
    pub(crate) algorithm: AlgorithmIdentifier,
    pub(crate) private_key: Vec<u8>,
}

impl PrivateKeyInfo {
    pub(crate) fn to_der(&self) -> Vec<u8> {
        Tlv::sequence(vec![
            Tlv::small_integer(0),
            self.algorithm.to_tlv(),
            Tlv::octet_string(&self.private_key),
        ])
        .to_der()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubjectPublicKeyInfo {
    pub(crate) algorithm: AlgorithmIdentifier,
    pub(crate) public_key: Vec<u8>,
}

impl SubjectPublicKeyInfo {
    pub(crate) fn to_der(&self) -> Vec<u8> {
        Tlv::sequence(vec![
            self.algorithm.to_tlv(),
            Tlv::bit_string(&self.public_key),
        ])
        .to_der()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncryptedPrivateKeyInfo {
    pub(crate) algorithm: AlgorithmIdentifier,
    pub(crate) encrypted_data: Vec<u8>,
}

impl EncryptedPrivateKeyInfo {
    pub(crate) fn to_der(&self) -> Vec<u8> {
        Tlv::sequence(vec![
            self.algorithm.to_tlv(),
            Tlv::octet_string(&self.encrypted_data),
        ])
        .to_der()
    }
}

/// The three top-level shapes key content can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyInfo {
    Private(PrivateKeyInfo),
    Public(SubjectPublicKeyInfo),
    Encrypted(EncryptedPrivateKeyInfo),
}

impl KeyInfo {
    pub(crate) fn from_der(der: &[u8]) -> Result<Self> {
        Tlv::from_der(der)?.decode()
    }

    pub(crate) fn algorithm(&self) -> &AlgorithmIdentifier {
        match self {
            KeyInfo::Private(info) => &info.algorithm,
            KeyInfo::Public(info) => &info.algorithm,
            KeyInfo::Encrypted(info) => &info.algorithm,
        }
    }
}

impl DecodableFrom<Tlv> for KeyInfo {}

impl Decoder<Tlv, KeyInfo> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<KeyInfo> {
        let children = self.expect_sequence()?;
        match children {
            [version, algorithm, private_key, ..] if version.tag() == Tag::Integer => {
                Ok(KeyInfo::Private(PrivateKeyInfo {
                    algorithm: AlgorithmIdentifier::from_tlv(algorithm)?,
                    private_key: private_key.expect_octet_string()?.to_vec(),
                }))
            }
            [algorithm, key] if key.tag() == Tag::BitString => {
                Ok(KeyInfo::Public(SubjectPublicKeyInfo {
                    algorithm: AlgorithmIdentifier::from_tlv(algorithm)?,
                    public_key: key.expect_bit_string()?.to_vec(),
                }))
            }
            [algorithm, data] if data.tag() == Tag::OctetString => {
                Ok(KeyInfo::Encrypted(EncryptedPrivateKeyInfo {
                    algorithm: AlgorithmIdentifier::from_tlv(algorithm)?,
                    encrypted_data: data.expect_octet_string()?.to_vec(),
                }))
            }
            _ => Err(Error::argument("content is not a PKCS#8 or SubjectPublicKeyInfo structure")),
        }
    }
}

/// `SEQUENCE { INTEGER, ... }` as used by DSA and ElGamal domain parameters.
pub(crate) fn integer_sequence(values: &[&[u8]]) -> Tlv {
    Tlv::sequence(values.iter().map(|v| Tlv::unsigned_integer(v)).collect())
}

pub(crate) fn read_integer_sequence(tlv: &Tlv, expected: usize) -> Result<Vec<Vec<u8>>> {
    let children = tlv.expect_sequence()?;
    if children.len() < expected {
        return Err(Error::argument(format!(
            "expected {expected} integers, found {}",
            children.len()
        )));
    }
    children[..expected]
        .iter()
        .map(|c| c.expect_unsigned_integer().map(<[u8]>::to_vec).map_err(Error::from))
        .collect()
}
