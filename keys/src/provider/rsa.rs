use log::info;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{Error, Result};
use crate::info::KeyInfo;
use crate::model::{AsymmetricKey, AsymmetricKeyPair, KeyData, KeyType};
use crate::provider::{KeyFamily, KeyProvider, KeySpec, bit_length, readable_info, unexpected_spec};

/// RSA keys with public exponent 65537. No minimum size is enforced here.
pub struct RsaProvider;

impl KeyProvider for RsaProvider {
    fn family(&self) -> KeyFamily {
        KeyFamily::Rsa
    }

    fn create_key_pair(&self, spec: &KeySpec) -> Result<AsymmetricKeyPair> {
        let KeySpec::Rsa { bits } = spec else {
            return Err(unexpected_spec(self.family(), spec));
        };
        info!("generating {bits}-bit RSA key");
        let private = RsaPrivateKey::new(&mut OsRng, *bits)?;
        let public = private.to_public_key();
        Ok(AsymmetricKeyPair::new(
            AsymmetricKey::Rsa(KeyData::new(
                private.to_pkcs8_der()?.as_bytes().to_vec(),
                KeyType::Private,
                *bits,
            )),
            AsymmetricKey::Rsa(KeyData::new(
                public.to_public_key_der()?.as_bytes().to_vec(),
                KeyType::Public,
                *bits,
            )),
        ))
    }

    fn get_key(&self, content: Vec<u8>, key_type: KeyType) -> Result<AsymmetricKey> {
        let key_size = match readable_info(&content, key_type)? {
            Some(info) => modulus_bits(&info)?,
            None => 0,
        };
        Ok(AsymmetricKey::Rsa(KeyData::new(content, key_type, key_size)))
    }

    fn verify_key_pair(&self, private: &AsymmetricKey, public: &AsymmetricKey) -> Result<bool> {
        let private = RsaPrivateKey::from_pkcs8_der(private.content())?;
        let public = RsaPublicKey::from_public_key_der(public.content())?;
        Ok(private.to_public_key() == public)
    }
}

/// The modulus is the first INTEGER of both `RSAPrivateKey` (after the
/// version) and `RSAPublicKey`.
fn modulus_bits(info: &KeyInfo) -> Result<usize> {
    let (inner, skip) = match info {
        KeyInfo::Private(info) => (&info.private_key, 1),
        KeyInfo::Public(info) => (&info.public_key, 0),
        KeyInfo::Encrypted(_) => return Ok(0),
    };
    let tlv = kagi_der::Tlv::from_der(inner)?;
    let modulus = tlv
        .expect_sequence()?
        .get(skip)
        .ok_or_else(|| Error::argument("RSA key without modulus"))?
        .expect_unsigned_integer()?;
    Ok(bit_length(modulus))
}
