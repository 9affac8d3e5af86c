//! PBES2 (RFC 8018) with PBKDF2-HMAC-SHA256 and AES-256-CBC.

use std::str::FromStr;

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use kagi_der::{ObjectIdentifier, Tlv};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::info::AlgorithmIdentifier;
use crate::mapper::OID_PBES2;

pub(super) const OID: &str = OID_PBES2;
const OID_PBKDF2: &str = "1.2.840.113549.1.5.12";
const OID_HMAC_SHA256: &str = "1.2.840.113549.2.9";
const OID_AES256_CBC: &str = "2.16.840.1.101.3.4.1.42";

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

struct Parameters {
    salt: Vec<u8>,
    iterations: u32,
    iv: Vec<u8>,
}

impl Parameters {
    fn to_tlv(&self) -> Result<Tlv> {
        let oid = |s: &str| ObjectIdentifier::from_str(s).map(|o| Tlv::oid(&o));
        let kdf = Tlv::sequence(vec![
            oid(OID_PBKDF2)?,
            Tlv::sequence(vec![
                Tlv::octet_string(&self.salt),
                Tlv::small_integer(self.iterations as u64),
                Tlv::small_integer(KEY_LEN as u64),
                Tlv::sequence(vec![oid(OID_HMAC_SHA256)?, Tlv::null()]),
            ]),
        ]);
        let cipher = Tlv::sequence(vec![oid(OID_AES256_CBC)?, Tlv::octet_string(&self.iv)]);
        Ok(Tlv::sequence(vec![kdf, cipher]))
    }

    fn from_algorithm(algorithm: &AlgorithmIdentifier) -> Result<Self> {
        let params = algorithm.expect_parameters()?.expect_sequence()?;
        let [kdf, cipher] = params else {
            return Err(malformed("PBES2 parameters"));
        };
        let kdf = AlgorithmIdentifier::from_tlv(kdf)?;
        if kdf.oid != OID_PBKDF2 {
            return Err(unsupported(&kdf.oid));
        }
        let kdf_params = kdf.expect_parameters()?.expect_sequence()?;
        let (salt, iterations) = match kdf_params {
            [salt, iterations, ..] => (salt.expect_octet_string()?, iterations.expect_small_integer()?),
            _ => return Err(malformed("PBKDF2 parameters")),
        };
        // optional keyLength and prf, which default to HMAC-SHA1
        let mut prf_seen = false;
        for extra in &kdf_params[2..] {
            match extra.tag() {
                kagi_der::Tag::Integer if extra.expect_small_integer()? != KEY_LEN as u64 => {
                    return Err(malformed("PBKDF2 key length"));
                }
                kagi_der::Tag::Sequence => {
                    let prf = AlgorithmIdentifier::from_tlv(extra)?;
                    if prf.oid != OID_HMAC_SHA256 {
                        return Err(unsupported(&prf.oid));
                    }
                    prf_seen = true;
                }
                _ => {}
            }
        }
        if !prf_seen {
            return Err(Error::Decryption("PBKDF2 with HMAC-SHA1 is not supported".to_string()));
        }

        let cipher = AlgorithmIdentifier::from_tlv(cipher)?;
        if cipher.oid != OID_AES256_CBC {
            return Err(unsupported(&cipher.oid));
        }
        let iv = cipher.expect_parameters()?.expect_octet_string()?.to_vec();
        if iv.len() != IV_LEN {
            return Err(malformed("AES-256-CBC IV"));
        }
        Ok(Parameters {
            salt: salt.to_vec(),
            iterations: u32::try_from(iterations).map_err(|_| malformed("PBKDF2 iteration count"))?,
            iv,
        })
    }

    fn derive_key(&self, password: &str) -> [u8; KEY_LEN] {
        pbkdf2::pbkdf2_hmac_array::<Sha256, KEY_LEN>(password.as_bytes(), &self.salt, self.iterations)
    }
}

fn malformed(what: &str) -> Error {
    Error::Decryption(format!("malformed {what}"))
}

fn unsupported(oid: &ObjectIdentifier) -> Error {
    Error::Decryption(format!("unsupported algorithm {oid}"))
}

pub(super) fn encrypt(
    password: &str,
    salt: &[u8],
    iterations: u32,
    plaintext: &[u8],
) -> Result<(AlgorithmIdentifier, Vec<u8>)> {
    let mut iv = vec![0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let parameters = Parameters {
        salt: salt.to_vec(),
        iterations,
        iv,
    };
    let key = parameters.derive_key(password);
    let ciphertext = cbc::Encryptor::<Aes256>::new_from_slices(&key, &parameters.iv)
        .map_err(|e| Error::argument(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    Ok((AlgorithmIdentifier::new(OID, Some(parameters.to_tlv()?))?, ciphertext))
}

pub(super) fn decrypt(
    password: &str,
    algorithm: &AlgorithmIdentifier,
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let parameters =
        Parameters::from_algorithm(algorithm).map_err(|e| Error::Decryption(e.to_string()))?;
    let key = parameters.derive_key(password);
    cbc::Decryptor::<Aes256>::new_from_slices(&key, &parameters.iv)
        .map_err(|e| Error::Decryption(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption("bad password or corrupted data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_round_trip() {
        let (algorithm, ciphertext) = encrypt("pw", b"salty", 7, b"0123456789abcdef").unwrap();
        // one full block of padding
        assert_eq!(32, ciphertext.len());
        let parameters = Parameters::from_algorithm(&algorithm).unwrap();
        assert_eq!(b"salty", &parameters.salt[..]);
        assert_eq!(7, parameters.iterations);
        assert_eq!(IV_LEN, parameters.iv.len());
    }

    #[test]
    fn test_rejects_foreign_cipher() {
        let parameters = Parameters {
            salt: vec![1],
            iterations: 1,
            iv: vec![0; IV_LEN],
        };
        let mut tlv = parameters.to_tlv().unwrap().to_der();
        // 2.16.840.1.101.3.4.1.42 -> .2 (AES-128-CBC)
        let at = tlv.iter().rposition(|b| *b == 42).unwrap();
        tlv[at] = 2;
        let algorithm = AlgorithmIdentifier::new(OID, Some(Tlv::from_der(&tlv).unwrap())).unwrap();
        assert!(matches!(decrypt("pw", &algorithm, &[0; 16]), Err(Error::Decryption(_))));
    }
}
