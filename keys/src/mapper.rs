//! Classification of algorithm identifiers and curve parameters.

use log::debug;

use crate::curve::{self, CurveParameters};
use crate::model::CipherType;

pub const OID_RSA: &str = "1.2.840.113549.1.1.1";
pub const OID_DSA: &str = "1.2.840.10040.4.1";
pub const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
pub const OID_GOST_R3410_2001: &str = "1.2.643.2.2.19";
pub const OID_ELGAMAL: &str = "1.3.14.7.2.1.1";
pub const OID_PBES2: &str = "1.2.840.113549.1.5.13";
pub const OID_PBE_SHA_3DES: &str = "1.2.840.113549.1.12.1.3";

const OID_TABLE: &[(&str, CipherType)] = &[
    (OID_RSA, CipherType::Rsa),
    (OID_DSA, CipherType::Dsa),
    (OID_EC_PUBLIC_KEY, CipherType::Ec),
    (OID_GOST_R3410_2001, CipherType::Ec),
    // PKCS#5 v1.5 PBES1
    ("1.2.840.113549.1.5.1", CipherType::Pkcs5Encrypted),
    ("1.2.840.113549.1.5.3", CipherType::Pkcs5Encrypted),
    ("1.2.840.113549.1.5.4", CipherType::Pkcs5Encrypted),
    ("1.2.840.113549.1.5.6", CipherType::Pkcs5Encrypted),
    ("1.2.840.113549.1.5.10", CipherType::Pkcs5Encrypted),
    ("1.2.840.113549.1.5.11", CipherType::Pkcs5Encrypted),
    // PKCS#12 pbeIds
    ("1.2.840.113549.1.12.1.1", CipherType::Pkcs12Encrypted),
    ("1.2.840.113549.1.12.1.2", CipherType::Pkcs12Encrypted),
    (OID_PBE_SHA_3DES, CipherType::Pkcs12Encrypted),
    ("1.2.840.113549.1.12.1.4", CipherType::Pkcs12Encrypted),
    ("1.2.840.113549.1.12.1.5", CipherType::Pkcs12Encrypted),
    ("1.2.840.113549.1.12.1.6", CipherType::Pkcs12Encrypted),
    (OID_PBES2, CipherType::Pkcs5Encrypted),
    (OID_ELGAMAL, CipherType::ElGamal),
];

/// Never fails: unmatched identifiers are [`CipherType::Unknown`].
pub fn map_oid_to_cipher_type(oid: &str) -> CipherType {
    let cipher_type = OID_TABLE
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, cipher_type)| *cipher_type)
        .unwrap_or(CipherType::Unknown);
    debug!("classified OID {oid} as {cipher_type}");
    cipher_type
}

/// Name of the first tabulated curve whose parameters all match, or
/// [`curve::UNKNOWN`].
pub fn map_curve_to_name(parameters: &CurveParameters) -> &'static str {
    curve::curves()
        .iter()
        .find(|c| c.parameters == *parameters)
        .map(|c| c.name)
        .unwrap_or(curve::UNKNOWN)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use rstest::rstest;

    use super::*;

    #[rstest(oid, expected,
        case("1.2.840.113549.1.1.1", CipherType::Rsa),
        case("1.2.840.10040.4.1", CipherType::Dsa),
        case("1.2.840.10045.2.1", CipherType::Ec),
        case("1.2.643.2.2.19", CipherType::Ec),
        case("1.2.840.113549.1.5.1", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.3", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.4", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.6", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.10", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.5.11", CipherType::Pkcs5Encrypted),
        case("1.2.840.113549.1.12.1.1", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.12.1.2", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.12.1.3", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.12.1.4", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.12.1.5", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.12.1.6", CipherType::Pkcs12Encrypted),
        case("1.2.840.113549.1.5.13", CipherType::Pkcs5Encrypted),
        case("1.3.14.7.2.1.1", CipherType::ElGamal),
        case("foo", CipherType::Unknown),
        case("", CipherType::Unknown),
        case("1.2.840.113549.1.1", CipherType::Unknown),
    )]
    fn test_map_oid_to_cipher_type(oid: &str, expected: CipherType) {
        assert_eq!(expected, map_oid_to_cipher_type(oid));
    }

    #[rstest(name, expected,
        case("secp256r1", "secp256r1"),
        case("prime256v1", "secp256r1"),
        case("P-256", "secp256r1"),
        case("P-384", "secp384r1"),
        case("secp256k1", "secp256k1"),
        case("curve25519", "curve25519"),
    )]
    fn test_map_curve_to_name(name: &str, expected: &str) {
        let parameters = &curve::by_name(name).unwrap().parameters;
        assert_eq!(expected, map_curve_to_name(parameters));
    }

    #[test]
    fn test_map_curve_to_name_unknown() {
        let mut parameters = curve::by_name("secp256k1").unwrap().parameters.clone();
        parameters.h = BigUint::from(4u8);
        assert_eq!("unknown", map_curve_to_name(&parameters));
    }
}
