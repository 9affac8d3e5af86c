//! Elliptic curve keys.
//!
//! Named curves go through the RustCrypto curve crates and are encoded with a
//! named-curve OID. curve25519 has no OID here, so its keys carry explicit
//! domain parameters and the X25519 u-coordinate as the public key.

use std::str::FromStr;

use kagi_der::{ObjectIdentifier, Tag, Tlv};
use log::info;
use num_bigint::BigUint;
use rand::RngCore;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret, X25519_BASEPOINT_BYTES, x25519};

use crate::curve::{self, CURVE25519, Curve, CurveParameters};
use crate::error::{Error, Result};
use crate::info::{AlgorithmIdentifier, KeyInfo, PrivateKeyInfo, SubjectPublicKeyInfo};
use crate::mapper::{OID_EC_PUBLIC_KEY, map_curve_to_name};
use crate::model::{AsymmetricKey, AsymmetricKeyPair, EcKey, KeyType};
use crate::provider::{KeyFamily, KeyProvider, KeySpec, readable_info, unexpected_spec};

/// X9.62 prime-field
const OID_PRIME_FIELD: &str = "1.2.840.10045.1.1";
const X25519_LEN: usize = 32;

pub struct EcProvider;

/// Implementation backing a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EcBackend {
    P256,
    P384,
    K256,
    Curve25519,
}

macro_rules! weierstrass {
    ($module:ident, $krate:ident) => {
        mod $module {
            use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
            use $krate::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use $krate::ecdsa::{Signature, SigningKey, VerifyingKey};
            use $krate::elliptic_curve::sec1::ToEncodedPoint;
            use $krate::{PublicKey, SecretKey};
            use rand::rngs::OsRng;

            use crate::error::Result;

            pub(super) fn generate() -> Result<(Vec<u8>, Vec<u8>)> {
                let secret = SecretKey::random(&mut OsRng);
                Ok((
                    secret.to_pkcs8_der()?.as_bytes().to_vec(),
                    secret.public_key().to_public_key_der()?.as_bytes().to_vec(),
                ))
            }

            pub(super) fn is_pair(private: &[u8], public: &[u8]) -> Result<bool> {
                let secret = SecretKey::from_pkcs8_der(private)?;
                Ok(secret.public_key() == PublicKey::from_public_key_der(public)?)
            }

            pub(super) fn sign_prehash(private: &[u8], prehash: &[u8]) -> Result<Vec<u8>> {
                let signing_key = SigningKey::from(SecretKey::from_pkcs8_der(private)?);
                let signature: Signature = signing_key.sign_prehash(prehash)?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify_prehash(public: &[u8], prehash: &[u8], signature: &[u8]) -> Result<bool> {
                let verifying_key = VerifyingKey::from(PublicKey::from_public_key_der(public)?);
                let Ok(signature) = Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(verifying_key.verify_prehash(prehash, &signature).is_ok())
            }

            /// Uncompressed SEC1 point of a public key.
            pub(super) fn public_point(public: &[u8]) -> Result<Vec<u8>> {
                let public = PublicKey::from_public_key_der(public)?;
                Ok(public.to_encoded_point(false).as_bytes().to_vec())
            }

            /// Uncompressed SEC1 point and scalar of a private key.
            pub(super) fn private_parts(private: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
                let secret = SecretKey::from_pkcs8_der(private)?;
                Ok((
                    secret.public_key().to_encoded_point(false).as_bytes().to_vec(),
                    secret.to_bytes().to_vec(),
                ))
            }

            pub(super) fn public_from_point(point: &[u8]) -> Result<Vec<u8>> {
                let public = PublicKey::from_sec1_bytes(point)?;
                Ok(public.to_public_key_der()?.as_bytes().to_vec())
            }

            /// `scalar` is left-padded to the field width.
            pub(super) fn private_from_scalar(scalar: &[u8], field_len: usize) -> Result<Vec<u8>> {
                let mut padded = vec![0u8; field_len.saturating_sub(scalar.len())];
                padded.extend_from_slice(scalar);
                let secret = SecretKey::from_slice(&padded)?;
                Ok(secret.to_pkcs8_der()?.as_bytes().to_vec())
            }
        }
    };
}

weierstrass!(nistp256, p256);
weierstrass!(nistp384, p384);
weierstrass!(secp256k1, k256);

impl EcBackend {
    pub(crate) fn for_curve(curve: &Curve) -> Result<Self> {
        match (curve.oid, curve.name) {
            (Some(curve::OID_SECP256R1), _) => Ok(EcBackend::P256),
            (Some(curve::OID_SECP384R1), _) => Ok(EcBackend::P384),
            (Some(curve::OID_SECP256K1), _) => Ok(EcBackend::K256),
            (None, CURVE25519) => Ok(EcBackend::Curve25519),
            _ => Err(Error::argument(format!("unsupported curve: {}", curve.name))),
        }
    }

    pub(crate) fn for_name(name: &str) -> Result<Self> {
        let curve = curve::by_name(name)
            .ok_or_else(|| Error::argument(format!("unsupported curve: {name}")))?;
        Self::for_curve(curve)
    }

    /// Backend of an EC key, from the curve recorded on the key.
    pub(crate) fn for_key(key: &AsymmetricKey) -> Result<Self> {
        match key {
            AsymmetricKey::Ec(k) => Self::for_name(k.curve()),
            other => Err(Error::argument(format!("{} is not an EC key", other.cipher_type()))),
        }
    }

    pub(crate) fn sign_prehash(&self, private: &[u8], prehash: &[u8]) -> Result<Vec<u8>> {
        match self {
            EcBackend::P256 => nistp256::sign_prehash(private, prehash),
            EcBackend::P384 => nistp384::sign_prehash(private, prehash),
            EcBackend::K256 => secp256k1::sign_prehash(private, prehash),
            EcBackend::Curve25519 => Err(no_signature()),
        }
    }

    pub(crate) fn verify_prehash(&self, public: &[u8], prehash: &[u8], signature: &[u8]) -> Result<bool> {
        match self {
            EcBackend::P256 => nistp256::verify_prehash(public, prehash, signature),
            EcBackend::P384 => nistp384::verify_prehash(public, prehash, signature),
            EcBackend::K256 => secp256k1::verify_prehash(public, prehash, signature),
            EcBackend::Curve25519 => Err(no_signature()),
        }
    }

    pub(crate) fn public_point(&self, public: &[u8]) -> Result<Vec<u8>> {
        match self {
            EcBackend::P256 => nistp256::public_point(public),
            EcBackend::P384 => nistp384::public_point(public),
            EcBackend::K256 => secp256k1::public_point(public),
            EcBackend::Curve25519 => Ok(curve25519::public_u(public)?.to_vec()),
        }
    }

    pub(crate) fn private_parts(&self, private: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        match self {
            EcBackend::P256 => nistp256::private_parts(private),
            EcBackend::P384 => nistp384::private_parts(private),
            EcBackend::K256 => secp256k1::private_parts(private),
            EcBackend::Curve25519 => {
                let (d, u) = curve25519::private_parts(private)?;
                Ok((u.to_vec(), d.to_vec()))
            }
        }
    }

    pub(crate) fn public_from_point(&self, point: &[u8]) -> Result<Vec<u8>> {
        match self {
            EcBackend::P256 => nistp256::public_from_point(point),
            EcBackend::P384 => nistp384::public_from_point(point),
            EcBackend::K256 => secp256k1::public_from_point(point),
            EcBackend::Curve25519 => Err(Error::invalid_operation(
                "curve25519 keys are not imported from points",
            )),
        }
    }

    pub(crate) fn private_from_scalar(&self, scalar: &[u8]) -> Result<Vec<u8>> {
        match self {
            EcBackend::P256 => nistp256::private_from_scalar(scalar, 32),
            EcBackend::P384 => nistp384::private_from_scalar(scalar, 48),
            EcBackend::K256 => secp256k1::private_from_scalar(scalar, 32),
            EcBackend::Curve25519 => Err(Error::invalid_operation(
                "curve25519 keys are not imported from scalars",
            )),
        }
    }
}

fn no_signature() -> Error {
    Error::argument("curve25519 keys have no signature algorithm")
}

/// curve25519 keys with explicit parameters.
mod curve25519 {
    use super::*;

    pub(super) fn algorithm(parameters: &CurveParameters) -> Result<AlgorithmIdentifier> {
        AlgorithmIdentifier::new(OID_EC_PUBLIC_KEY, Some(explicit_parameters(parameters)?))
    }

    /// Private scalars are redrawn until their minimal big-endian encoding
    /// is exactly 32 bytes.
    pub(super) fn generate(parameters: &CurveParameters) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut rng = OsRng;
        let mut d = [0u8; X25519_LEN];
        loop {
            rng.fill_bytes(&mut d);
            if BigUint::from_bytes_be(&d).to_bytes_be().len() == X25519_LEN {
                break;
            }
        }
        let secret = StaticSecret::from(d);
        let u = X25519PublicKey::from(&secret).to_bytes();
        let algorithm = algorithm(parameters)?;

        let ec_private_key = Tlv::sequence(vec![
            Tlv::small_integer(1),
            Tlv::octet_string(&d),
            Tlv::context(1, Tlv::bit_string(&u)),
        ]);
        let private = PrivateKeyInfo {
            algorithm: algorithm.clone(),
            private_key: ec_private_key.to_der(),
        };
        let public = SubjectPublicKeyInfo {
            algorithm,
            public_key: u.to_vec(),
        };
        Ok((private.to_der(), public.to_der()))
    }

    fn fixed(bytes: &[u8]) -> Result<[u8; X25519_LEN]> {
        bytes
            .try_into()
            .map_err(|_| Error::argument(format!("curve25519 value of {} bytes", bytes.len())))
    }

    pub(super) fn private_parts(private: &[u8]) -> Result<([u8; X25519_LEN], [u8; X25519_LEN])> {
        let KeyInfo::Private(info) = KeyInfo::from_der(private)? else {
            return Err(Error::argument("not a curve25519 private key"));
        };
        let ec_private_key = Tlv::from_der(&info.private_key)?;
        let children = ec_private_key.expect_sequence()?;
        let d = fixed(
            children
                .get(1)
                .ok_or_else(|| Error::argument("ECPrivateKey without scalar"))?
                .expect_octet_string()?,
        )?;
        Ok((d, x25519(d, X25519_BASEPOINT_BYTES)))
    }

    pub(super) fn public_u(public: &[u8]) -> Result<[u8; X25519_LEN]> {
        match KeyInfo::from_der(public)? {
            KeyInfo::Public(info) => fixed(&info.public_key),
            _ => Err(Error::argument("not a curve25519 public key")),
        }
    }

    pub(super) fn is_pair(private: &[u8], public: &[u8]) -> Result<bool> {
        let (_, derived) = private_parts(private)?;
        Ok(derived == public_u(public)?)
    }
}

fn pad(value: &BigUint, len: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut out = vec![0u8; len.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}

/// X9.62 `ECParameters` with a prime field.
fn explicit_parameters(c: &CurveParameters) -> Result<Tlv> {
    let len = c.field_len();
    let mut base = vec![0x04];
    base.extend(pad(&c.gx, len));
    base.extend(pad(&c.gy, len));
    Ok(Tlv::sequence(vec![
        Tlv::small_integer(1),
        Tlv::sequence(vec![
            Tlv::oid(&ObjectIdentifier::from_str(OID_PRIME_FIELD)?),
            Tlv::unsigned_integer(&c.p.to_bytes_be()),
        ]),
        Tlv::sequence(vec![
            Tlv::octet_string(&pad(&c.a, len)),
            Tlv::octet_string(&pad(&c.b, len)),
        ]),
        Tlv::octet_string(&base),
        Tlv::unsigned_integer(&c.n.to_bytes_be()),
        Tlv::unsigned_integer(&c.h.to_bytes_be()),
    ]))
}

fn parse_explicit_parameters(tlv: &Tlv) -> Result<CurveParameters> {
    let malformed = || Error::argument("malformed explicit curve parameters");
    let children = tlv.expect_sequence()?;
    let (field, coefficients, base, order) = match children {
        [_, field, coefficients, base, order, ..] => (field, coefficients, base, order),
        _ => return Err(malformed()),
    };
    let field = field.expect_sequence()?;
    if field.len() != 2 || field[0].expect_oid()? != OID_PRIME_FIELD {
        return Err(Error::argument("only prime-field curves are supported"));
    }
    let coefficients = coefficients.expect_sequence()?;
    if coefficients.len() < 2 {
        return Err(malformed());
    }
    let base = base.expect_octet_string()?;
    if base.first() != Some(&0x04) || base.len() % 2 != 1 {
        return Err(Error::argument("only uncompressed base points are supported"));
    }
    let (gx, gy) = base[1..].split_at(base.len() / 2);
    let h = match children.get(5) {
        Some(h) => BigUint::from_bytes_be(h.expect_unsigned_integer()?),
        None => BigUint::from(1u8),
    };
    Ok(CurveParameters {
        p: BigUint::from_bytes_be(field[1].expect_unsigned_integer()?),
        a: BigUint::from_bytes_be(coefficients[0].expect_octet_string()?),
        b: BigUint::from_bytes_be(coefficients[1].expect_octet_string()?),
        gx: BigUint::from_bytes_be(gx),
        gy: BigUint::from_bytes_be(gy),
        n: BigUint::from_bytes_be(order.expect_unsigned_integer()?),
        h,
    })
}

/// Curve name and field size of an `id-ecPublicKey` algorithm identifier.
/// Unrecognised curves are reported as `"unknown"`.
pub(crate) fn curve_of(algorithm: &AlgorithmIdentifier) -> Result<(String, usize)> {
    let parameters = algorithm.expect_parameters()?;
    match parameters.tag() {
        Tag::ObjectIdentifier => {
            let oid = parameters.expect_oid()?.to_string();
            Ok(match curve::by_oid(&oid) {
                Some(c) => (
                    map_curve_to_name(&c.parameters).to_string(),
                    c.parameters.field_bits(),
                ),
                None => (curve::UNKNOWN.to_string(), 0),
            })
        }
        Tag::Sequence => {
            let parameters = parse_explicit_parameters(parameters)?;
            Ok((
                map_curve_to_name(&parameters).to_string(),
                parameters.field_bits(),
            ))
        }
        _ => Err(Error::argument("unsupported EC parameters encoding")),
    }
}

impl KeyProvider for EcProvider {
    fn family(&self) -> KeyFamily {
        KeyFamily::Ec
    }

    fn create_key_pair(&self, spec: &KeySpec) -> Result<AsymmetricKeyPair> {
        let KeySpec::Ec { curve: requested } = spec else {
            return Err(unexpected_spec(self.family(), spec));
        };
        let entry = curve::by_name(requested)
            .ok_or_else(|| Error::argument(format!("unsupported curve: {requested}")))?;
        let name = map_curve_to_name(&entry.parameters);
        let bits = entry.parameters.field_bits();
        info!("generating EC key on {name}");
        let (private, public) = match EcBackend::for_curve(entry)? {
            EcBackend::P256 => nistp256::generate()?,
            EcBackend::P384 => nistp384::generate()?,
            EcBackend::K256 => secp256k1::generate()?,
            EcBackend::Curve25519 => curve25519::generate(&entry.parameters)?,
        };
        Ok(AsymmetricKeyPair::new(
            AsymmetricKey::Ec(EcKey::new(private, KeyType::Private, bits, name)),
            AsymmetricKey::Ec(EcKey::new(public, KeyType::Public, bits, name)),
        ))
    }

    fn get_key(&self, content: Vec<u8>, key_type: KeyType) -> Result<AsymmetricKey> {
        let (name, bits) = match readable_info(&content, key_type)? {
            Some(info) => curve_of(info.algorithm())?,
            None => (curve::UNKNOWN.to_string(), 0),
        };
        Ok(AsymmetricKey::Ec(EcKey::new(content, key_type, bits, name)))
    }

    fn verify_key_pair(&self, private: &AsymmetricKey, public: &AsymmetricKey) -> Result<bool> {
        if private.curve() != public.curve() {
            return Ok(false);
        }
        match EcBackend::for_key(private)? {
            EcBackend::P256 => nistp256::is_pair(private.content(), public.content()),
            EcBackend::P384 => nistp384::is_pair(private.content(), public.content()),
            EcBackend::K256 => secp256k1::is_pair(private.content(), public.content()),
            EcBackend::Curve25519 => curve25519::is_pair(private.content(), public.content()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest(requested, expected, bits,
        case("secp256r1", "secp256r1", 256),
        case("prime256v1", "secp256r1", 256),
        case("P-256", "secp256r1", 256),
        case("secp384r1", "secp384r1", 384),
        case("P-384", "secp384r1", 384),
        case("secp256k1", "secp256k1", 256),
        case("curve25519", "curve25519", 255),
    )]
    fn test_create_verify_reload(requested: &str, expected: &str, bits: usize) {
        let spec = KeySpec::Ec { curve: requested.to_string() };
        let pair = EcProvider.create_key_pair(&spec).unwrap();
        assert_eq!(Some(expected), pair.private_key().curve());
        assert_eq!(bits, pair.key_length_in_bits());
        assert!(EcProvider.verify_key_pair(pair.private_key(), pair.public_key()).unwrap());

        for key in [pair.private_key(), pair.public_key()] {
            let loaded = EcProvider.get_key(key.content().to_vec(), key.key_type()).unwrap();
            assert_eq!(key, &loaded);
        }

        let other = EcProvider.create_key_pair(&spec).unwrap();
        assert!(!EcProvider.verify_key_pair(pair.private_key(), other.public_key()).unwrap());
    }

    #[test]
    fn test_curve25519_scalar_width() {
        let spec = KeySpec::Ec { curve: CURVE25519.to_string() };
        for _ in 0..8 {
            let pair = EcProvider.create_key_pair(&spec).unwrap();
            let (d, _) = curve25519::private_parts(pair.private_key().content()).unwrap();
            assert_ne!(0, d[0]);
        }
    }

    #[test]
    fn test_explicit_parameters_round_trip() {
        let parameters = &curve::by_name("secp256k1").unwrap().parameters;
        let tlv = explicit_parameters(parameters).unwrap();
        assert_eq!(parameters, &parse_explicit_parameters(&tlv).unwrap());
    }

    #[test]
    fn test_unknown_curve() {
        assert!(matches!(
            EcProvider.create_key_pair(&KeySpec::Ec { curve: "brainpoolP256r1".to_string() }),
            Err(Error::Argument(_))
        ));

        let mut parameters = curve::by_name("P-256").unwrap().parameters.clone();
        parameters.b += 1u32;
        let algorithm = AlgorithmIdentifier::new(OID_EC_PUBLIC_KEY, Some(explicit_parameters(&parameters).unwrap())).unwrap();
        assert_eq!(("unknown".to_string(), 256), curve_of(&algorithm).unwrap());
    }
}
