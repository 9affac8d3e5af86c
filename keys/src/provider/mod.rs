//! Key generation, loading and pair verification, one provider per family.
//!
//! Family dispatch is the closed [`KeyFamily`] enum; every match over it is
//! exhaustive, so adding a family means wiring a provider everywhere.

pub mod dsa;
pub mod ec;
pub mod elgamal;
pub mod modp;
pub mod rsa;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::debug;
use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::info::KeyInfo;
use crate::model::{AsymmetricKey, AsymmetricKeyPair, CipherType, KeyType};
use modp::ElGamalGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Dsa,
    Ec,
    ElGamal,
}

impl KeyFamily {
    pub const ALL: [KeyFamily; 4] = [KeyFamily::Rsa, KeyFamily::Dsa, KeyFamily::Ec, KeyFamily::ElGamal];

    pub fn cipher_type(&self) -> CipherType {
        match self {
            KeyFamily::Rsa => CipherType::Rsa,
            KeyFamily::Dsa => CipherType::Dsa,
            KeyFamily::Ec => CipherType::Ec,
            KeyFamily::ElGamal => CipherType::ElGamal,
        }
    }

    /// `None` for unknown and encrypted cipher types.
    pub fn from_cipher_type(cipher_type: CipherType) -> Option<Self> {
        match cipher_type {
            CipherType::Rsa => Some(KeyFamily::Rsa),
            CipherType::Dsa => Some(KeyFamily::Dsa),
            CipherType::Ec => Some(KeyFamily::Ec),
            CipherType::ElGamal => Some(KeyFamily::ElGamal),
            CipherType::Unknown | CipherType::Pkcs5Encrypted | CipherType::Pkcs12Encrypted => None,
        }
    }

    pub fn provider(&self) -> &'static dyn KeyProvider {
        match self {
            KeyFamily::Rsa => &self::rsa::RsaProvider,
            KeyFamily::Dsa => &self::dsa::DsaProvider,
            KeyFamily::Ec => &ec::EcProvider,
            KeyFamily::ElGamal => &elgamal::ElGamalProvider,
        }
    }
}

impl Display for KeyFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cipher_type())
    }
}

impl FromStr for KeyFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" => Ok(KeyFamily::Rsa),
            "dsa" => Ok(KeyFamily::Dsa),
            "ec" | "ecdsa" => Ok(KeyFamily::Ec),
            "elgamal" => Ok(KeyFamily::ElGamal),
            other => Err(Error::argument(format!("unsupported algorithm: {other}"))),
        }
    }
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    Rsa { bits: usize },
    Dsa { bits: usize },
    Ec { curve: String },
    /// A `group` selects the fast path; without one a fresh safe prime group
    /// of `bits` is generated.
    ElGamal { bits: usize, group: Option<ElGamalGroup> },
}

impl KeySpec {
    pub fn family(&self) -> KeyFamily {
        match self {
            KeySpec::Rsa { .. } => KeyFamily::Rsa,
            KeySpec::Dsa { .. } => KeyFamily::Dsa,
            KeySpec::Ec { .. } => KeyFamily::Ec,
            KeySpec::ElGamal { .. } => KeyFamily::ElGamal,
        }
    }

    /// True when generation searches for new primes and may take minutes.
    pub fn is_long_running(&self) -> bool {
        matches!(self, KeySpec::ElGamal { group: None, .. })
    }
}

pub trait KeyProvider {
    fn family(&self) -> KeyFamily;

    fn create_key_pair(&self, spec: &KeySpec) -> Result<AsymmetricKeyPair>;

    /// Wraps `content` as a key of this family. Only what is needed for the
    /// size (and curve) is read; the content is not validated beyond that.
    fn get_key(&self, content: Vec<u8>, key_type: KeyType) -> Result<AsymmetricKey>;

    /// True iff `public` is derivable from `private`. Both keys belong to
    /// this provider's family.
    fn verify_key_pair(&self, private: &AsymmetricKey, public: &AsymmetricKey) -> Result<bool>;
}

pub fn create_key_pair(spec: &KeySpec) -> Result<AsymmetricKeyPair> {
    let provider = spec.family().provider();
    debug!("creating {} key pair", provider.family());
    provider.create_key_pair(spec)
}

pub fn verify_key_pair(pair: &AsymmetricKeyPair) -> Result<bool> {
    let private = pair.private_key();
    let public = pair.public_key();
    let family = KeyFamily::from_cipher_type(private.cipher_type()).ok_or_else(|| {
        Error::argument(format!(
            "cannot verify a key pair of cipher type {}",
            private.cipher_type()
        ))
    })?;
    if public.cipher_type() != private.cipher_type() {
        return Err(Error::invalid_operation(format!(
            "key pair mixes {} and {} keys",
            private.cipher_type(),
            public.cipher_type()
        )));
    }
    if !private.is_private_key() || public.is_private_key() {
        return Err(Error::argument("key pair needs one private and one public key"));
    }
    family.provider().verify_key_pair(private, public)
}

pub(crate) fn unexpected_spec(family: KeyFamily, spec: &KeySpec) -> Error {
    Error::argument(format!("{family} provider cannot create a {} key", spec.family()))
}

/// Key info for the roles whose content is readable; `None` for encrypted content.
pub(crate) fn readable_info(content: &[u8], key_type: KeyType) -> Result<Option<KeyInfo>> {
    match key_type {
        KeyType::Public | KeyType::Private => Ok(Some(KeyInfo::from_der(content)?)),
        KeyType::Encrypted | KeyType::RsaPkcs12 => Ok(None),
    }
}

pub(crate) fn bit_length(magnitude: &[u8]) -> usize {
    BigUint::from_bytes_be(magnitude).bits() as usize
}
