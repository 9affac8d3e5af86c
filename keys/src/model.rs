//! Immutable key values.
//!
//! Every key carries its canonical DER encoding:
//! - private keys: PKCS#8 `PrivateKeyInfo`
//! - public keys: X.509 `SubjectPublicKeyInfo`
//! - encrypted keys: PKCS#8 `EncryptedPrivateKeyInfo`
//!
//! The algorithm family is the enum variant of [`AsymmetricKey`]. An encrypted
//! key hides its family until it is decrypted, so it is a variant of its own.

use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};

/// Encoding role of a key's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Public,
    Private,
    Encrypted,
    /// RSA private key held in a PKCS#12 encrypted container
    RsaPkcs12,
}

/// Classification of key material, usually derived from an algorithm OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherType {
    Rsa,
    Dsa,
    Ec,
    ElGamal,
    Unknown,
    Pkcs5Encrypted,
    Pkcs12Encrypted,
}

impl CipherType {
    pub fn is_encryption_scheme(&self) -> bool {
        matches!(self, CipherType::Pkcs5Encrypted | CipherType::Pkcs12Encrypted)
    }
}

impl Display for CipherType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CipherType::Rsa => "RSA",
            CipherType::Dsa => "DSA",
            CipherType::Ec => "EC",
            CipherType::ElGamal => "ElGamal",
            CipherType::Unknown => "Unknown",
            CipherType::Pkcs5Encrypted => "PKCS#5 encrypted",
            CipherType::Pkcs12Encrypted => "PKCS#12 encrypted",
        };
        write!(f, "{name}")
    }
}

/// Content shared by the RSA, DSA and ElGamal variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyData {
    content: Vec<u8>,
    key_type: KeyType,
    key_size: usize,
}

impl KeyData {
    pub fn new(content: Vec<u8>, key_type: KeyType, key_size: usize) -> Self {
        KeyData {
            content,
            key_type,
            key_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcKey {
    data: KeyData,
    curve: String,
}

impl EcKey {
    pub fn new(content: Vec<u8>, key_type: KeyType, key_size: usize, curve: impl Into<String>) -> Self {
        EcKey {
            data: KeyData::new(content, key_type, key_size),
            curve: curve.into(),
        }
    }

    pub fn curve(&self) -> &str {
        &self.curve
    }

    pub fn is_curve25519(&self) -> bool {
        self.curve == crate::curve::CURVE25519
    }
}

/// Opaque PBE ciphertext container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedKey {
    content: Vec<u8>,
    cipher_type: CipherType,
}

impl EncryptedKey {
    /// `cipher_type` names the encryption scheme and must be one of the
    /// encrypted cipher types.
    pub fn new(content: Vec<u8>, cipher_type: CipherType) -> Result<Self> {
        if !cipher_type.is_encryption_scheme() {
            return Err(Error::argument(format!(
                "{cipher_type} is not an encryption scheme"
            )));
        }
        Ok(EncryptedKey {
            content,
            cipher_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsymmetricKey {
    Rsa(KeyData),
    Dsa(KeyData),
    Ec(EcKey),
    ElGamal(KeyData),
    Encrypted(EncryptedKey),
}

impl AsymmetricKey {
    pub fn content(&self) -> &[u8] {
        match self {
            AsymmetricKey::Rsa(k) | AsymmetricKey::Dsa(k) | AsymmetricKey::ElGamal(k) => &k.content,
            AsymmetricKey::Ec(k) => &k.data.content,
            AsymmetricKey::Encrypted(k) => &k.content,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            AsymmetricKey::Rsa(k) | AsymmetricKey::Dsa(k) | AsymmetricKey::ElGamal(k) => k.key_type,
            AsymmetricKey::Ec(k) => k.data.key_type,
            AsymmetricKey::Encrypted(_) => KeyType::Encrypted,
        }
    }

    /// Size in bits; always 0 for encrypted keys.
    pub fn key_size(&self) -> usize {
        match self {
            AsymmetricKey::Rsa(k) | AsymmetricKey::Dsa(k) | AsymmetricKey::ElGamal(k) => k.key_size,
            AsymmetricKey::Ec(k) => k.data.key_size,
            AsymmetricKey::Encrypted(_) => 0,
        }
    }

    pub fn cipher_type(&self) -> CipherType {
        match self {
            AsymmetricKey::Rsa(_) => CipherType::Rsa,
            AsymmetricKey::Dsa(_) => CipherType::Dsa,
            AsymmetricKey::Ec(_) => CipherType::Ec,
            AsymmetricKey::ElGamal(_) => CipherType::ElGamal,
            AsymmetricKey::Encrypted(k) => k.cipher_type,
        }
    }

    /// Encrypted containers always hold a private key.
    pub fn is_private_key(&self) -> bool {
        match self {
            AsymmetricKey::Encrypted(_) => true,
            _ => self.key_type() == KeyType::Private,
        }
    }

    /// RSA keys count as encrypted only when tagged [`KeyType::RsaPkcs12`];
    /// all other variants when tagged [`KeyType::Encrypted`].
    pub fn is_encrypted(&self) -> bool {
        match self {
            AsymmetricKey::Rsa(k) => k.key_type == KeyType::RsaPkcs12,
            _ => self.key_type() == KeyType::Encrypted,
        }
    }

    pub fn curve(&self) -> Option<&str> {
        match self {
            AsymmetricKey::Ec(k) => Some(k.curve()),
            _ => None,
        }
    }

    pub fn is_curve25519(&self) -> bool {
        matches!(self, AsymmetricKey::Ec(k) if k.is_curve25519())
    }
}

impl Display for AsymmetricKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let role = match self.key_type() {
            KeyType::Public => "public",
            KeyType::Private => "private",
            KeyType::Encrypted | KeyType::RsaPkcs12 => "encrypted private",
        };
        match self {
            AsymmetricKey::Encrypted(k) => write!(f, "{} key", k.cipher_type),
            AsymmetricKey::Ec(k) => write!(f, "{}-bit EC ({}) {role} key", k.data.key_size, k.curve),
            _ => write!(f, "{}-bit {} {role} key", self.key_size(), self.cipher_type()),
        }
    }
}

/// A private key and its public counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsymmetricKeyPair {
    private_key: AsymmetricKey,
    public_key: AsymmetricKey,
    password: Option<String>,
}

impl AsymmetricKeyPair {
    pub fn new(private_key: AsymmetricKey, public_key: AsymmetricKey) -> Self {
        AsymmetricKeyPair {
            private_key,
            public_key,
            password: None,
        }
    }

    pub fn private_key(&self) -> &AsymmetricKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &AsymmetricKey {
        &self.public_key
    }

    pub fn key_length_in_bits(&self) -> usize {
        self.private_key.key_size()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// The password can be assigned once.
    pub fn set_password(&mut self, password: impl Into<String>) -> Result<()> {
        if self.password.is_some() {
            return Err(Error::invalid_operation("key pair password is already set"));
        }
        self.password = Some(password.into());
        Ok(())
    }

    pub fn with_password(mut self, password: Option<String>) -> Result<Self> {
        if let Some(password) = password {
            self.set_password(password)?;
        }
        Ok(self)
    }

    pub fn into_keys(self) -> (AsymmetricKey, AsymmetricKey) {
        (self.private_key, self.public_key)
    }
}

/// Signing output together with the content it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    signed_data: Vec<u8>,
    content: Vec<u8>,
}

impl Signature {
    pub fn new(signed_data: Vec<u8>, content: Vec<u8>) -> Self {
        Signature {
            signed_data,
            content,
        }
    }

    pub fn signed_data(&self) -> &[u8] {
        &self.signed_data
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_encrypted_key_attributes() {
        let key = AsymmetricKey::Encrypted(
            EncryptedKey::new(vec![0x01], CipherType::Pkcs5Encrypted).unwrap(),
        );
        assert_eq!(KeyType::Encrypted, key.key_type());
        assert_eq!(0, key.key_size());
        assert!(key.is_encrypted());
        assert!(key.is_private_key());
        assert_eq!(CipherType::Pkcs5Encrypted, key.cipher_type());
    }

    #[rstest(cipher_type, case(CipherType::Rsa), case(CipherType::Unknown), case(CipherType::Ec))]
    fn test_encrypted_key_rejects_plain_cipher(cipher_type: CipherType) {
        assert!(matches!(
            EncryptedKey::new(vec![0x01], cipher_type),
            Err(Error::Argument(_))
        ));
    }

    #[rstest(key, expected,
        case(AsymmetricKey::Rsa(KeyData::new(vec![1], KeyType::RsaPkcs12, 4096)), true),
        case(AsymmetricKey::Rsa(KeyData::new(vec![1], KeyType::Encrypted, 4096)), false),
        case(AsymmetricKey::Dsa(KeyData::new(vec![1], KeyType::Encrypted, 2048)), true),
        case(AsymmetricKey::Dsa(KeyData::new(vec![1], KeyType::RsaPkcs12, 2048)), false),
        case(AsymmetricKey::ElGamal(KeyData::new(vec![1], KeyType::Private, 2048)), false),
        case(AsymmetricKey::Ec(EcKey::new(vec![1], KeyType::Encrypted, 256, "secp256r1")), true),
    )]
    fn test_is_encrypted(key: AsymmetricKey, expected: bool) {
        assert_eq!(expected, key.is_encrypted());
    }

    #[test]
    fn test_private_and_curve_predicates() {
        let key = AsymmetricKey::Ec(EcKey::new(vec![1], KeyType::Private, 255, "curve25519"));
        assert!(key.is_private_key());
        assert!(key.is_curve25519());
        assert_eq!(Some("curve25519"), key.curve());

        let public = AsymmetricKey::Rsa(KeyData::new(vec![1], KeyType::Public, 4096));
        assert!(!public.is_private_key());
        assert!(!public.is_curve25519());
        assert_eq!(None, public.curve());
    }

    #[test]
    fn test_key_pair_password_is_assigned_once() {
        let private = AsymmetricKey::Rsa(KeyData::new(vec![1], KeyType::Private, 4096));
        let public = AsymmetricKey::Rsa(KeyData::new(vec![2], KeyType::Public, 4096));
        let mut pair = AsymmetricKeyPair::new(private, public);
        assert_eq!(4096, pair.key_length_in_bits());
        assert!(!pair.has_password());

        pair.set_password("").unwrap();
        assert!(!pair.has_password());
        assert!(matches!(
            pair.set_password("secret"),
            Err(Error::InvalidOperation(_))
        ));
        assert_eq!(Some(""), pair.password());
    }
}
