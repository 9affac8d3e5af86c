//! Password-based encryption of PKCS#8 private keys.
//!
//! Ciphertext is always carried in an `EncryptedPrivateKeyInfo` whose
//! algorithm identifier holds everything needed to decrypt except the
//! password.

mod pkcs12;
mod pkcs5;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::debug;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::info::{EncryptedPrivateKeyInfo, KeyInfo};
use crate::mapper::map_oid_to_cipher_type;
use crate::model::{AsymmetricKey, EncryptedKey};
use crate::parser::parse_key;

pub const DEFAULT_SALT_LENGTH: usize = 1024;
pub const DEFAULT_ITERATIONS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PbeScheme {
    /// PBES2 with PBKDF2-HMAC-SHA256 and AES-256-CBC
    Pkcs5,
    /// pbeWithSHAAnd3-KeyTripleDES-CBC
    Pkcs12,
}

impl Display for PbeScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PbeScheme::Pkcs5 => write!(f, "pkcs5"),
            PbeScheme::Pkcs12 => write!(f, "pkcs12"),
        }
    }
}

impl FromStr for PbeScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pkcs5" => Ok(PbeScheme::Pkcs5),
            "pkcs12" => Ok(PbeScheme::Pkcs12),
            other => Err(Error::argument(format!("unsupported encryption scheme: {other}"))),
        }
    }
}

/// Salt length in bytes and KDF iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbeConfig {
    salt_length: usize,
    iterations: u32,
}

impl PbeConfig {
    pub fn new(salt_length: usize, iterations: u32) -> Result<Self> {
        if salt_length == 0 {
            return Err(Error::argument("PBE salt length must be at least 1 byte"));
        }
        if iterations == 0 {
            return Err(Error::argument("PBE iteration count must be at least 1"));
        }
        Ok(PbeConfig {
            salt_length,
            iterations,
        })
    }

    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for PbeConfig {
    fn default() -> Self {
        PbeConfig {
            salt_length: DEFAULT_SALT_LENGTH,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Encrypts `plaintext` into a DER `EncryptedPrivateKeyInfo`.
pub fn encrypt(
    password: &str,
    salt: &[u8],
    iterations: u32,
    plaintext: &[u8],
    scheme: PbeScheme,
) -> Result<Vec<u8>> {
    if salt.is_empty() || iterations == 0 {
        return Err(Error::argument("PBE needs a salt and at least one iteration"));
    }
    debug!("encrypting {} bytes with {scheme}", plaintext.len());
    let (algorithm, encrypted_data) = match scheme {
        PbeScheme::Pkcs5 => pkcs5::encrypt(password, salt, iterations, plaintext)?,
        PbeScheme::Pkcs12 => pkcs12::encrypt(password, salt, iterations, plaintext)?,
    };
    Ok(EncryptedPrivateKeyInfo {
        algorithm,
        encrypted_data,
    }
    .to_der())
}

/// Decrypts a DER `EncryptedPrivateKeyInfo`. Every failure, including a
/// malformed container, is reported as [`Error::Decryption`].
pub fn decrypt(password: &str, container: &[u8]) -> Result<Vec<u8>> {
    let info = match KeyInfo::from_der(container) {
        Ok(KeyInfo::Encrypted(info)) => info,
        Ok(_) => return Err(Error::Decryption("not an encrypted private key".to_string())),
        Err(e) => return Err(Error::Decryption(e.to_string())),
    };
    let oid = info.algorithm.oid.to_string();
    debug!("decrypting container with scheme {oid}");
    match oid.as_str() {
        pkcs5::OID => pkcs5::decrypt(password, &info.algorithm, &info.encrypted_data),
        pkcs12::OID => pkcs12::decrypt(password, &info.algorithm, &info.encrypted_data),
        other => Err(Error::Decryption(format!("unsupported encryption scheme {other}"))),
    }
}

/// Encrypts a private key under a fresh random salt.
pub fn encrypt_key(
    key: &AsymmetricKey,
    password: &str,
    scheme: PbeScheme,
    config: &PbeConfig,
) -> Result<AsymmetricKey> {
    if !key.is_private_key() || key.is_encrypted() {
        return Err(Error::argument(format!("cannot encrypt a {key}")));
    }
    if password.is_empty() {
        return Err(Error::argument("encryption requires a password"));
    }
    let mut salt = vec![0u8; config.salt_length()];
    OsRng.fill_bytes(&mut salt);
    let content = encrypt(password, &salt, config.iterations(), key.content(), scheme)?;
    let cipher_type = match scheme {
        PbeScheme::Pkcs5 => map_oid_to_cipher_type(pkcs5::OID),
        PbeScheme::Pkcs12 => map_oid_to_cipher_type(pkcs12::OID),
    };
    Ok(AsymmetricKey::Encrypted(EncryptedKey::new(content, cipher_type)?))
}

/// Decrypts an encrypted key and parses the recovered private key.
pub fn decrypt_key(key: &AsymmetricKey, password: &str) -> Result<AsymmetricKey> {
    let AsymmetricKey::Encrypted(_) = key else {
        return Err(Error::argument(format!("{key} is not encrypted")));
    };
    let plaintext = decrypt(password, key.content())?;
    parse_key(&plaintext).map_err(|e| Error::Decryption(e.to_string()))
}
