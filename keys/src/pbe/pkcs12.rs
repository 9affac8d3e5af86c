//! pbeWithSHAAnd3-KeyTripleDES-CBC with the RFC 7292 appendix B KDF.

use des::TdesEde3;
use des::cipher::block_padding::Pkcs7;
use des::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use kagi_der::Tlv;
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::info::AlgorithmIdentifier;
use crate::mapper::OID_PBE_SHA_3DES;

pub(super) const OID: &str = OID_PBE_SHA_3DES;

const KEY_ID: u8 = 1;
const IV_ID: u8 = 2;
const KEY_LEN: usize = 24;
const IV_LEN: usize = 8;
/// SHA-1 block size in bytes
const V: usize = 64;

/// BMPString with a two byte terminator.
fn bmp_password(password: &str) -> Vec<u8> {
    let mut out: Vec<u8> = password.encode_utf16().flat_map(u16::to_be_bytes).collect();
    out.extend_from_slice(&[0, 0]);
    out
}

/// `s` repeated to the next multiple of `V` bytes.
fn fill(s: &[u8]) -> Vec<u8> {
    if s.is_empty() {
        return Vec::new();
    }
    s.iter().cycle().take(V * s.len().div_ceil(V)).copied().collect()
}

fn derive(password: &[u8], salt: &[u8], iterations: u32, id: u8, n: usize) -> Vec<u8> {
    let d = [id; V];
    let mut i = fill(salt);
    i.extend(fill(password));

    let mut out = Vec::with_capacity(n);
    loop {
        let mut a = Sha1::new().chain_update(d).chain_update(&i).finalize();
        for _ in 1..iterations {
            a = Sha1::digest(a);
        }
        out.extend_from_slice(&a);
        if out.len() >= n {
            out.truncate(n);
            return out;
        }

        let b: Vec<u8> = a.iter().cycle().take(V).copied().collect();
        for block in i.chunks_mut(V) {
            // block = (block + b + 1) mod 2^(8V)
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().zip(&b).rev() {
                let sum = *x as u16 + *y as u16 + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }
    }
}

fn key_and_iv(password: &str, salt: &[u8], iterations: u32) -> (Vec<u8>, Vec<u8>) {
    let password = bmp_password(password);
    (
        derive(&password, salt, iterations, KEY_ID, KEY_LEN),
        derive(&password, salt, iterations, IV_ID, IV_LEN),
    )
}

pub(super) fn encrypt(
    password: &str,
    salt: &[u8],
    iterations: u32,
    plaintext: &[u8],
) -> Result<(AlgorithmIdentifier, Vec<u8>)> {
    let (key, iv) = key_and_iv(password, salt, iterations);
    let ciphertext = cbc::Encryptor::<TdesEde3>::new_from_slices(&key, &iv)
        .map_err(|e| Error::argument(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let parameters = Tlv::sequence(vec![
        Tlv::octet_string(salt),
        Tlv::small_integer(iterations as u64),
    ]);
    Ok((AlgorithmIdentifier::new(OID, Some(parameters))?, ciphertext))
}

fn read_parameters(algorithm: &AlgorithmIdentifier) -> Result<(Vec<u8>, u32)> {
    match algorithm.expect_parameters()?.expect_sequence()? {
        [salt, iterations] => Ok((
            salt.expect_octet_string()?.to_vec(),
            u32::try_from(iterations.expect_small_integer()?)
                .map_err(|_| Error::Decryption("iteration count out of range".to_string()))?,
        )),
        _ => Err(Error::Decryption("malformed PKCS#12 PBE parameters".to_string())),
    }
}

pub(super) fn decrypt(
    password: &str,
    algorithm: &AlgorithmIdentifier,
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let (salt, iterations) =
        read_parameters(algorithm).map_err(|e| Error::Decryption(e.to_string()))?;
    let (key, iv) = key_and_iv(password, &salt, iterations);
    cbc::Decryptor::<TdesEde3>::new_from_slices(&key, &iv)
        .map_err(|e| Error::Decryption(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption("bad password or corrupted data".to_string()))
}
