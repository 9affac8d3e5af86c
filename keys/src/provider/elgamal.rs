use log::info;
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::info::{
    AlgorithmIdentifier, KeyInfo, PrivateKeyInfo, SubjectPublicKeyInfo, integer_sequence,
    read_integer_sequence,
};
use crate::mapper::OID_ELGAMAL;
use crate::model::{AsymmetricKey, AsymmetricKeyPair, KeyData, KeyType};
use crate::provider::modp::{self, ElGamalGroup};
use crate::provider::{KeyFamily, KeyProvider, KeySpec, readable_info, unexpected_spec};

/// ElGamal over a prime field. Keys are PKCS#8 / SubjectPublicKeyInfo with
/// `SEQUENCE { p, g }` parameters and a bare INTEGER key value.
pub struct ElGamalProvider;

struct ElGamalParts {
    group: ElGamalGroup,
    value: BigUint,
}

impl ElGamalParts {
    fn from_info(info: &KeyInfo) -> Result<Self> {
        let (algorithm, inner) = match info {
            KeyInfo::Private(info) => (&info.algorithm, &info.private_key),
            KeyInfo::Public(info) => (&info.algorithm, &info.public_key),
            KeyInfo::Encrypted(_) => return Err(Error::argument("ElGamal key is encrypted")),
        };
        let params = read_integer_sequence(algorithm.expect_parameters()?, 2)?;
        let value = kagi_der::Tlv::from_der(inner)?.expect_unsigned_integer()?.to_vec();
        Ok(ElGamalParts {
            group: ElGamalGroup {
                p: BigUint::from_bytes_be(&params[0]),
                g: BigUint::from_bytes_be(&params[1]),
            },
            value: BigUint::from_bytes_be(&value),
        })
    }

    fn algorithm(group: &ElGamalGroup) -> Result<AlgorithmIdentifier> {
        AlgorithmIdentifier::new(
            OID_ELGAMAL,
            Some(integer_sequence(&[&group.p.to_bytes_be(), &group.g.to_bytes_be()])),
        )
    }
}

impl KeyProvider for ElGamalProvider {
    fn family(&self) -> KeyFamily {
        KeyFamily::ElGamal
    }

    fn create_key_pair(&self, spec: &KeySpec) -> Result<AsymmetricKeyPair> {
        let KeySpec::ElGamal { bits, group } = spec else {
            return Err(unexpected_spec(self.family(), spec));
        };
        let group = match group {
            Some(group) => group.clone(),
            None => modp::generate_group(*bits)?,
        };
        let key_size = group.bits();
        info!("generating {key_size}-bit ElGamal key");

        // x in [1, p - 2]
        let x = OsRng.gen_biguint_range(&BigUint::one(), &(&group.p - 1u32));
        let y = group.g.modpow(&x, &group.p);
        let algorithm = ElGamalParts::algorithm(&group)?;

        let private = PrivateKeyInfo {
            algorithm: algorithm.clone(),
            private_key: kagi_der::Tlv::unsigned_integer(&x.to_bytes_be()).to_der(),
        };
        let public = SubjectPublicKeyInfo {
            algorithm,
            public_key: kagi_der::Tlv::unsigned_integer(&y.to_bytes_be()).to_der(),
        };
        Ok(AsymmetricKeyPair::new(
            AsymmetricKey::ElGamal(KeyData::new(private.to_der(), KeyType::Private, key_size)),
            AsymmetricKey::ElGamal(KeyData::new(public.to_der(), KeyType::Public, key_size)),
        ))
    }

    fn get_key(&self, content: Vec<u8>, key_type: KeyType) -> Result<AsymmetricKey> {
        let key_size = match readable_info(&content, key_type)? {
            Some(info) => ElGamalParts::from_info(&info)?.group.bits(),
            None => 0,
        };
        Ok(AsymmetricKey::ElGamal(KeyData::new(content, key_type, key_size)))
    }

    fn verify_key_pair(&self, private: &AsymmetricKey, public: &AsymmetricKey) -> Result<bool> {
        let private = ElGamalParts::from_info(&KeyInfo::from_der(private.content())?)?;
        let public = ElGamalParts::from_info(&KeyInfo::from_der(public.content())?)?;
        if private.group != public.group {
            return Ok(false);
        }
        Ok(private.group.g.modpow(&private.value, &private.group.p) == public.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_spec() -> KeySpec {
        KeySpec::ElGamal {
            bits: 2048,
            group: Some(modp::get_parameters_by_key_size(2048).unwrap()),
        }
    }

    #[test]
    fn test_create_with_standard_group() {
        let pair = ElGamalProvider.create_key_pair(&standard_spec()).unwrap();
        assert_eq!(2048, pair.key_length_in_bits());
        assert!(ElGamalProvider.verify_key_pair(pair.private_key(), pair.public_key()).unwrap());

        let other = ElGamalProvider.create_key_pair(&standard_spec()).unwrap();
        assert!(!ElGamalProvider.verify_key_pair(pair.private_key(), other.public_key()).unwrap());
    }

    #[test]
    fn test_create_with_generated_group() {
        let spec = KeySpec::ElGamal { bits: 96, group: None };
        let pair = ElGamalProvider.create_key_pair(&spec).unwrap();
        assert_eq!(96, pair.key_length_in_bits());
        assert!(ElGamalProvider.verify_key_pair(pair.private_key(), pair.public_key()).unwrap());
    }

    #[test]
    fn test_get_key() {
        let pair = ElGamalProvider.create_key_pair(&standard_spec()).unwrap();
        let loaded = ElGamalProvider
            .get_key(pair.public_key().content().to_vec(), KeyType::Public)
            .unwrap();
        assert_eq!(pair.public_key(), &loaded);
        assert!(ElGamalProvider.get_key(vec![0x30, 0x00], KeyType::Public).is_err());
    }
}
