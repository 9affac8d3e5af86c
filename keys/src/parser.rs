//! DER key content to typed keys.

use log::debug;

use crate::error::{Error, Result};
use crate::info::KeyInfo;
use crate::mapper::map_oid_to_cipher_type;
use crate::model::{AsymmetricKey, EncryptedKey, KeyType};
use crate::provider::KeyFamily;

/// Parses a PKCS#8 `PrivateKeyInfo`, `EncryptedPrivateKeyInfo` or X.509
/// `SubjectPublicKeyInfo`. The family comes from the algorithm OID.
pub fn parse_key(der: &[u8]) -> Result<AsymmetricKey> {
    let info = KeyInfo::from_der(der)?;
    let oid = info.algorithm().oid.to_string();
    let cipher_type = map_oid_to_cipher_type(&oid);
    debug!("parsing key with algorithm {oid} ({cipher_type})");

    let key_type = match info {
        KeyInfo::Private(_) => KeyType::Private,
        KeyInfo::Public(_) => KeyType::Public,
        KeyInfo::Encrypted(_) => {
            return Ok(AsymmetricKey::Encrypted(EncryptedKey::new(der.to_vec(), cipher_type)?));
        }
    };
    match KeyFamily::from_cipher_type(cipher_type) {
        Some(family) => family.provider().get_key(der.to_vec(), key_type),
        None => Err(Error::argument(format!("unsupported key algorithm {oid}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kagi_der::{ObjectIdentifier, Tlv};
    use rstest::rstest;

    use super::*;
    use crate::model::CipherType;

    fn container(oid: &str, outer: Tlv) -> Vec<u8> {
        let algorithm = Tlv::sequence(vec![Tlv::oid(&ObjectIdentifier::from_str(oid).unwrap())]);
        Tlv::sequence(vec![algorithm, outer]).to_der()
    }

    #[rstest(oid, cipher_type,
        case("1.2.840.113549.1.5.13", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.3", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.12.1.3", CipherType::Pkcs12Encrypted),
    )]
    fn test_encrypted_container(oid: &str, cipher_type: CipherType) {
        let der = container(oid, Tlv::octet_string(&[0x01]));
        let key = parse_key(&der).unwrap();
        assert_eq!(KeyType::Encrypted, key.key_type());
        assert_eq!(cipher_type, key.cipher_type());
        assert_eq!(0, key.key_size());
        assert!(key.is_encrypted());
        assert!(key.is_private_key());
    }

    #[test]
    fn test_unknown_algorithm() {
        let der = container("1.2.3.4", Tlv::bit_string(&[0x01]));
        assert!(matches!(parse_key(&der), Err(Error::Argument(_))));
        // a key algorithm cannot label an encrypted container
        let der = container("1.2.840.113549.1.1.1", Tlv::octet_string(&[0x01]));
        assert!(matches!(parse_key(&der), Err(Error::Argument(_))));
    }

    #[test]
    fn test_garbage() {
        assert!(parse_key(b"not a key").is_err());
    }
}
