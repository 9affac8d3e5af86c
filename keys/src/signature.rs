//! Signing and verification with the algorithm fixed per key family.

use std::fmt::{Display, Formatter};

use log::debug;
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rand::rngs::OsRng;
use rsa::signature::{DigestSigner, DigestVerifier, RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey, pss};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};
use crate::model::{AsymmetricKey, AsymmetricKeyPair, CipherType, Signature};
use crate::pbe;
use crate::provider::ec::EcBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// RSASSA-PSS with SHA-512 and MGF1-SHA-512
    Sha512WithRsaPss,
    Sha256WithDsa,
    /// Fixed-width `r || s`
    Sha512WithEcdsa,
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha512WithRsaPss => "SHA512withRSA/PSS",
            SignatureAlgorithm::Sha256WithDsa => "SHA256withDSA",
            SignatureAlgorithm::Sha512WithEcdsa => "SHA512withECDSA",
        }
    }

    pub fn for_key(key: &AsymmetricKey) -> Result<Self> {
        match key.cipher_type() {
            CipherType::Rsa => Ok(SignatureAlgorithm::Sha512WithRsaPss),
            CipherType::Dsa => Ok(SignatureAlgorithm::Sha256WithDsa),
            CipherType::Ec if !key.is_curve25519() => Ok(SignatureAlgorithm::Sha512WithEcdsa),
            _ => Err(Error::argument(format!("no signature algorithm for a {key}"))),
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A private key ready to sign with.
#[derive(Debug, Clone)]
pub struct SigningKey {
    key: AsymmetricKey,
    algorithm: SignatureAlgorithm,
}

/// A public key ready to verify with.
#[derive(Debug, Clone)]
pub struct VerifyingKey {
    key: AsymmetricKey,
    algorithm: SignatureAlgorithm,
}

impl SigningKey {
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn sign(&self, content: &[u8]) -> Result<Signature> {
        debug!("signing {} bytes with {}", content.len(), self.algorithm);
        let der = self.key.content();
        let signed_data = match self.algorithm {
            SignatureAlgorithm::Sha512WithRsaPss => {
                let key = pss::BlindedSigningKey::<Sha512>::new(RsaPrivateKey::from_pkcs8_der(der)?);
                key.try_sign_with_rng(&mut OsRng, content)?.to_vec()
            }
            SignatureAlgorithm::Sha256WithDsa => {
                let key = dsa::SigningKey::from_pkcs8_der(der)?;
                let signature: dsa::Signature = key.try_sign_digest(Sha256::new_with_prefix(content))?;
                signature.to_vec()
            }
            SignatureAlgorithm::Sha512WithEcdsa => {
                EcBackend::for_key(&self.key)?.sign_prehash(der, &Sha512::digest(content))?
            }
        };
        Ok(Signature::new(signed_data, content.to_vec()))
    }
}

impl VerifyingKey {
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// False for a mismatching or malformed signature.
    pub fn verify(&self, signature: &Signature) -> Result<bool> {
        debug!("verifying with {}", self.algorithm);
        let der = self.key.content();
        let content = signature.content();
        let signed_data = signature.signed_data();
        match self.algorithm {
            SignatureAlgorithm::Sha512WithRsaPss => {
                let key = pss::VerifyingKey::<Sha512>::new(RsaPublicKey::from_public_key_der(der)?);
                let Ok(signature) = pss::Signature::try_from(signed_data) else {
                    return Ok(false);
                };
                Ok(key.verify(content, &signature).is_ok())
            }
            SignatureAlgorithm::Sha256WithDsa => {
                let key = dsa::VerifyingKey::from_public_key_der(der)?;
                let Ok(signature) = dsa::Signature::try_from(signed_data) else {
                    return Ok(false);
                };
                Ok(key
                    .verify_digest(Sha256::new_with_prefix(content), &signature)
                    .is_ok())
            }
            SignatureAlgorithm::Sha512WithEcdsa => EcBackend::for_key(&self.key)?.verify_prehash(
                der,
                &Sha512::digest(content),
                signed_data,
            ),
        }
    }
}

/// Resolves the signing key, decrypting it first when it is encrypted.
pub fn get_for_signing(key: &AsymmetricKey, password: Option<&str>) -> Result<SigningKey> {
    let key = if key.is_encrypted() {
        match password {
            Some(password) if !password.is_empty() => pbe::decrypt_key(key, password)?,
            _ => return Err(Error::argument("an encrypted key needs a password to sign with")),
        }
    } else {
        key.clone()
    };
    if !key.is_private_key() {
        return Err(Error::argument(format!("cannot sign with a {key}")));
    }
    let algorithm = SignatureAlgorithm::for_key(&key)?;
    Ok(SigningKey { key, algorithm })
}

pub fn get_for_verifying(key: &AsymmetricKey) -> Result<VerifyingKey> {
    if key.is_private_key() {
        return Err(Error::argument(format!("cannot verify with a {key}")));
    }
    let algorithm = SignatureAlgorithm::for_key(key)?;
    Ok(VerifyingKey {
        key: key.clone(),
        algorithm,
    })
}

/// Signs with the pair's private key, using the pair's password if the key is
/// encrypted.
pub fn create_signature(pair: &AsymmetricKeyPair, content: &[u8]) -> Result<Signature> {
    get_for_signing(pair.private_key(), pair.password())?.sign(content)
}

pub fn verify_signature(pair: &AsymmetricKeyPair, signature: &Signature) -> Result<bool> {
    get_for_verifying(pair.public_key())?.verify(signature)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::pbe::{PbeConfig, PbeScheme, encrypt_key};
    use crate::provider::modp::get_parameters_by_key_size;
    use crate::provider::{KeySpec, create_key_pair};

    #[rstest(spec, algorithm,
        case(KeySpec::Rsa { bits: 1024 }, SignatureAlgorithm::Sha512WithRsaPss),
        case(KeySpec::Ec { curve: "secp256r1".to_string() }, SignatureAlgorithm::Sha512WithEcdsa),
        case(KeySpec::Ec { curve: "P-384".to_string() }, SignatureAlgorithm::Sha512WithEcdsa),
        case(KeySpec::Ec { curve: "secp256k1".to_string() }, SignatureAlgorithm::Sha512WithEcdsa),
    )]
    fn test_sign_and_verify(spec: KeySpec, algorithm: SignatureAlgorithm) {
        let pair = create_key_pair(&spec).unwrap();
        let signature = create_signature(&pair, b"hello").unwrap();
        assert_eq!(b"hello", signature.content());
        assert_eq!(algorithm, get_for_signing(pair.private_key(), None).unwrap().algorithm());
        assert!(verify_signature(&pair, &signature).unwrap());

        let tampered = Signature::new(signature.signed_data().to_vec(), b"hellO".to_vec());
        assert!(!verify_signature(&pair, &tampered).unwrap());
        let garbage = Signature::new(vec![1, 2, 3], b"hello".to_vec());
        assert!(!verify_signature(&pair, &garbage).unwrap());
    }

    #[test]
    fn test_dsa_sign_and_verify() {
        let pair = create_key_pair(&KeySpec::Dsa { bits: 2048 }).unwrap();
        let signature = create_signature(&pair, b"content").unwrap();
        assert!(verify_signature(&pair, &signature).unwrap());
        let other = Signature::new(signature.signed_data().to_vec(), b"other".to_vec());
        assert!(!verify_signature(&pair, &other).unwrap());
    }

    #[test]
    fn test_encrypted_key_needs_password() {
        let pair = create_key_pair(&KeySpec::Ec { curve: "P-256".to_string() }).unwrap();
        let config = PbeConfig::new(8, 1).unwrap();
        let encrypted = encrypt_key(pair.private_key(), "pw", PbeScheme::Pkcs5, &config).unwrap();

        for password in [None, Some("")] {
            assert!(matches!(get_for_signing(&encrypted, password), Err(Error::Argument(_))));
        }
        let signer = get_for_signing(&encrypted, Some("pw")).unwrap();
        let signature = signer.sign(b"data").unwrap();
        assert!(get_for_verifying(pair.public_key()).unwrap().verify(&signature).unwrap());
    }

    #[test]
    fn test_unsupported_keys() {
        let x25519 = create_key_pair(&KeySpec::Ec { curve: "curve25519".to_string() }).unwrap();
        let elgamal = create_key_pair(&KeySpec::ElGamal {
            bits: 2048,
            group: Some(get_parameters_by_key_size(2048).unwrap()),
        })
        .unwrap();
        for pair in [x25519, elgamal] {
            assert!(matches!(create_signature(&pair, b"x"), Err(Error::Argument(_))));
            assert!(matches!(get_for_verifying(pair.public_key()), Err(Error::Argument(_))));
        }
    }

    #[test]
    fn test_roles() {
        let pair = create_key_pair(&KeySpec::Ec { curve: "P-256".to_string() }).unwrap();
        assert!(matches!(get_for_signing(pair.public_key(), None), Err(Error::Argument(_))));
        assert!(matches!(get_for_verifying(pair.private_key()), Err(Error::Argument(_))));
    }
}
