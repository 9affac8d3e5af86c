//! Conversion between DER keys and SSH key material.

use kagi_ssh::{PrivateKeyFields, PublicKeyBlob, SshCurve};
use num_bigint::BigUint;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{Error, Result};
use crate::info::KeyInfo;
use crate::model::{AsymmetricKey, KeyType};
use crate::parser::parse_key;
use crate::provider::dsa::DsaParts;
use crate::provider::ec::EcBackend;

/// Fails for keys that have no SSH form.
pub(crate) fn ensure_supported(key: &AsymmetricKey) -> Result<()> {
    match key {
        AsymmetricKey::ElGamal(_) => Err(Error::argument("ElGamal keys have no SSH representation")),
        AsymmetricKey::Ec(_) => ssh_curve(EcBackend::for_key(key)?).map(|_| ()),
        _ => Ok(()),
    }
}

fn ssh_curve(backend: EcBackend) -> Result<SshCurve> {
    match backend {
        EcBackend::P256 => Ok(SshCurve::NistP256),
        EcBackend::P384 => Ok(SshCurve::NistP384),
        EcBackend::K256 => Err(Error::argument("secp256k1 keys have no SSH representation")),
        EcBackend::Curve25519 => Err(Error::argument("curve25519 keys have no SSH representation")),
    }
}

fn backend(curve: SshCurve) -> EcBackend {
    match curve {
        SshCurve::NistP256 => EcBackend::P256,
        SshCurve::NistP384 => EcBackend::P384,
    }
}

fn rsa_bytes(n: &rsa::BigUint) -> Vec<u8> {
    n.to_bytes_be()
}

fn rsa_int(bytes: &[u8]) -> rsa::BigUint {
    rsa::BigUint::from_bytes_be(bytes)
}

pub(crate) fn public_blob(key: &AsymmetricKey) -> Result<PublicKeyBlob> {
    ensure_supported(key)?;
    if key.key_type() != KeyType::Public {
        return Err(Error::argument(format!("expected a public key, found a {key}")));
    }
    let der = key.content();
    match key {
        AsymmetricKey::Rsa(_) => {
            let public = RsaPublicKey::from_public_key_der(der)?;
            Ok(PublicKeyBlob::Rsa {
                e: rsa_bytes(public.e()),
                n: rsa_bytes(public.n()),
            })
        }
        AsymmetricKey::Dsa(_) => {
            let parts = DsaParts::from_info(&KeyInfo::from_der(der)?)?;
            Ok(PublicKeyBlob::Dsa {
                p: parts.p,
                q: parts.q,
                g: parts.g,
                y: parts.value,
            })
        }
        AsymmetricKey::Ec(_) => {
            let backend = EcBackend::for_key(key)?;
            Ok(PublicKeyBlob::Ecdsa {
                curve: ssh_curve(backend)?,
                point: backend.public_point(der)?,
            })
        }
        AsymmetricKey::ElGamal(_) | AsymmetricKey::Encrypted(_) => {
            Err(Error::argument(format!("{key} has no SSH public key form")))
        }
    }
}

pub(crate) fn private_fields(key: &AsymmetricKey) -> Result<PrivateKeyFields> {
    ensure_supported(key)?;
    if key.key_type() != KeyType::Private {
        return Err(Error::argument(format!("expected a private key, found a {key}")));
    }
    let der = key.content();
    match key {
        AsymmetricKey::Rsa(_) => {
            let private = RsaPrivateKey::from_pkcs8_der(der)?;
            let [p, q] = private.primes() else {
                return Err(Error::argument("multi-prime RSA keys have no SSH form"));
            };
            let p_int = BigUint::from_bytes_be(&p.to_bytes_be());
            let iqmp = BigUint::from_bytes_be(&q.to_bytes_be())
                .modinv(&p_int)
                .ok_or_else(|| Error::argument("RSA primes are not coprime"))?;
            Ok(PrivateKeyFields::Rsa {
                n: rsa_bytes(private.n()),
                e: rsa_bytes(private.e()),
                d: rsa_bytes(private.d()),
                iqmp: iqmp.to_bytes_be(),
                p: rsa_bytes(p),
                q: rsa_bytes(q),
            })
        }
        AsymmetricKey::Dsa(_) => {
            let parts = DsaParts::from_info(&KeyInfo::from_der(der)?)?;
            let y = parts.public_value();
            Ok(PrivateKeyFields::Dsa {
                p: parts.p,
                q: parts.q,
                g: parts.g,
                y,
                x: parts.value,
            })
        }
        AsymmetricKey::Ec(_) => {
            let backend = EcBackend::for_key(key)?;
            let curve = ssh_curve(backend)?;
            let (point, d) = backend.private_parts(der)?;
            Ok(PrivateKeyFields::Ecdsa { curve, point, d })
        }
        AsymmetricKey::ElGamal(_) | AsymmetricKey::Encrypted(_) => {
            Err(Error::argument(format!("{key} has no SSH private key form")))
        }
    }
}

pub(crate) fn public_from_blob(blob: &PublicKeyBlob) -> Result<AsymmetricKey> {
    let der = match blob {
        PublicKeyBlob::Rsa { e, n } => RsaPublicKey::new(rsa_int(n), rsa_int(e))?
            .to_public_key_der()?
            .as_bytes()
            .to_vec(),
        PublicKeyBlob::Dsa { p, q, g, y } => DsaParts {
            p: p.clone(),
            q: q.clone(),
            g: g.clone(),
            value: y.clone(),
        }
        .to_public_der()?,
        PublicKeyBlob::Ecdsa { curve, point } => backend(*curve).public_from_point(point)?,
    };
    parse_key(&der)
}

pub(crate) fn private_from_fields(fields: &PrivateKeyFields) -> Result<AsymmetricKey> {
    let der = match fields {
        PrivateKeyFields::Rsa { n, e, d, p, q, .. } => RsaPrivateKey::from_components(
            rsa_int(n),
            rsa_int(e),
            rsa_int(d),
            vec![rsa_int(p), rsa_int(q)],
        )?
        .to_pkcs8_der()?
        .as_bytes()
        .to_vec(),
        PrivateKeyFields::Dsa { p, q, g, y, x } => {
            let parts = DsaParts {
                p: p.clone(),
                q: q.clone(),
                g: g.clone(),
                value: x.clone(),
            };
            if parts.public_value() != *y {
                return Err(Error::argument("DSA public value does not match the private key"));
            }
            parts.to_private_der()?
        }
        PrivateKeyFields::Ecdsa { curve, point, d } => {
            let backend = backend(*curve);
            let der = backend.private_from_scalar(d)?;
            if backend.private_parts(&der)?.0 != *point {
                return Err(Error::argument("EC public point does not match the private key"));
            }
            der
        }
    };
    parse_key(&der)
}
