use dsa::{Components, KeySize, SigningKey};
use log::info;
use num_bigint::BigUint;
use pkcs8::{EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::info::{
    AlgorithmIdentifier, KeyInfo, PrivateKeyInfo, SubjectPublicKeyInfo, integer_sequence,
    read_integer_sequence,
};
use crate::mapper::OID_DSA;
use crate::model::{AsymmetricKey, AsymmetricKeyPair, KeyData, KeyType};
use crate::provider::{KeyFamily, KeyProvider, KeySpec, bit_length, readable_info, unexpected_spec};

/// FIPS 186-3 DSA with a 256-bit subgroup.
pub struct DsaProvider;

/// Domain parameters and the key value (`x` or `y`), unsigned big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DsaParts {
    pub(crate) p: Vec<u8>,
    pub(crate) q: Vec<u8>,
    pub(crate) g: Vec<u8>,
    pub(crate) value: Vec<u8>,
}

impl DsaParts {
    pub(crate) fn from_info(info: &KeyInfo) -> Result<Self> {
        let (algorithm, inner) = match info {
            KeyInfo::Private(info) => (&info.algorithm, &info.private_key),
            KeyInfo::Public(info) => (&info.algorithm, &info.public_key),
            KeyInfo::Encrypted(_) => return Err(Error::argument("DSA key is encrypted")),
        };
        let mut params = read_integer_sequence(algorithm.expect_parameters()?, 3)?.into_iter();
        let value = kagi_der::Tlv::from_der(inner)?.expect_unsigned_integer()?.to_vec();
        match (params.next(), params.next(), params.next()) {
            (Some(p), Some(q), Some(g)) => Ok(DsaParts { p, q, g, value }),
            _ => Err(Error::argument("incomplete DSA parameters")),
        }
    }

    fn algorithm(&self) -> Result<AlgorithmIdentifier> {
        AlgorithmIdentifier::new(OID_DSA, Some(integer_sequence(&[&self.p, &self.q, &self.g])))
    }

    pub(crate) fn to_private_der(&self) -> Result<Vec<u8>> {
        Ok(PrivateKeyInfo {
            algorithm: self.algorithm()?,
            private_key: kagi_der::Tlv::unsigned_integer(&self.value).to_der(),
        }
        .to_der())
    }

    pub(crate) fn to_public_der(&self) -> Result<Vec<u8>> {
        Ok(SubjectPublicKeyInfo {
            algorithm: self.algorithm()?,
            public_key: kagi_der::Tlv::unsigned_integer(&self.value).to_der(),
        }
        .to_der())
    }

    /// `g^x mod p` for a private part.
    pub(crate) fn public_value(&self) -> Vec<u8> {
        let p = BigUint::from_bytes_be(&self.p);
        BigUint::from_bytes_be(&self.g)
            .modpow(&BigUint::from_bytes_be(&self.value), &p)
            .to_bytes_be()
    }
}

fn key_size(bits: usize) -> Result<KeySize> {
    match bits {
        2048 => Ok(KeySize::DSA_2048_256),
        3072 => Ok(KeySize::DSA_3072_256),
        other => Err(Error::argument(format!(
            "unsupported DSA key size {other}, use 2048 or 3072"
        ))),
    }
}

impl KeyProvider for DsaProvider {
    fn family(&self) -> KeyFamily {
        KeyFamily::Dsa
    }

    fn create_key_pair(&self, spec: &KeySpec) -> Result<AsymmetricKeyPair> {
        let KeySpec::Dsa { bits } = spec else {
            return Err(unexpected_spec(self.family(), spec));
        };
        let size = key_size(*bits)?;
        info!("generating {bits}-bit DSA parameters");
        let components = Components::generate(&mut OsRng, size);
        let signing_key = SigningKey::generate(&mut OsRng, components);
        Ok(AsymmetricKeyPair::new(
            AsymmetricKey::Dsa(KeyData::new(
                signing_key.to_pkcs8_der()?.as_bytes().to_vec(),
                KeyType::Private,
                *bits,
            )),
            AsymmetricKey::Dsa(KeyData::new(
                signing_key.verifying_key().to_public_key_der()?.as_bytes().to_vec(),
                KeyType::Public,
                *bits,
            )),
        ))
    }

    fn get_key(&self, content: Vec<u8>, key_type: KeyType) -> Result<AsymmetricKey> {
        let key_size = match readable_info(&content, key_type)? {
            Some(info) => bit_length(&DsaParts::from_info(&info)?.p),
            None => 0,
        };
        Ok(AsymmetricKey::Dsa(KeyData::new(content, key_type, key_size)))
    }

    fn verify_key_pair(&self, private: &AsymmetricKey, public: &AsymmetricKey) -> Result<bool> {
        let private = DsaParts::from_info(&KeyInfo::from_der(private.content())?)?;
        let public = DsaParts::from_info(&KeyInfo::from_der(public.content())?)?;
        let same_domain = (&private.p, &private.q, &private.g) == (&public.p, &public.q, &public.g);
        Ok(same_domain && private.public_value() == public.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_verify_and_reload() {
        let pair = DsaProvider.create_key_pair(&KeySpec::Dsa { bits: 2048 }).unwrap();
        assert_eq!(2048, pair.key_length_in_bits());
        assert!(DsaProvider.verify_key_pair(pair.private_key(), pair.public_key()).unwrap());

        let public = DsaParts::from_info(&KeyInfo::from_der(pair.public_key().content()).unwrap()).unwrap();
        assert_eq!(32, public.q.len());
        let rebuilt = public.to_public_der().unwrap();
        assert_eq!(pair.public_key().content(), &rebuilt[..]);

        let loaded = DsaProvider
            .get_key(pair.private_key().content().to_vec(), KeyType::Private)
            .unwrap();
        assert_eq!(pair.private_key(), &loaded);
    }

    #[test]
    fn test_mismatched_public_value() {
        let private = DsaParts {
            p: vec![23],
            q: vec![11],
            g: vec![4],
            value: vec![3],
        };
        // 4^3 mod 23 = 18
        let matching = DsaParts { value: vec![18], ..private.clone() };
        let other = DsaParts { value: vec![9], ..private.clone() };
        let private_key = DsaProvider
            .get_key(private.to_private_der().unwrap(), KeyType::Private)
            .unwrap();
        let good = DsaProvider.get_key(matching.to_public_der().unwrap(), KeyType::Public).unwrap();
        let bad = DsaProvider.get_key(other.to_public_der().unwrap(), KeyType::Public).unwrap();
        assert_eq!(5, private_key.key_size());
        assert!(DsaProvider.verify_key_pair(&private_key, &good).unwrap());
        assert!(!DsaProvider.verify_key_pair(&private_key, &bad).unwrap());
    }

    #[test]
    fn test_unsupported_size() {
        assert!(matches!(
            DsaProvider.create_key_pair(&KeySpec::Dsa { bits: 1024 }),
            Err(Error::Argument(_))
        ));
    }
}
