//! Tabulated elliptic curve domain parameters.
//!
//! Synonyms are separate entries with identical parameters, so a lookup by
//! parameters returns the first of them.

use std::sync::LazyLock;

use num_bigint::BigUint;

pub const CURVE25519: &str = "curve25519";
pub const UNKNOWN: &str = "unknown";

pub const OID_SECP256R1: &str = "1.2.840.10045.3.1.7";
pub const OID_SECP384R1: &str = "1.3.132.0.34";
pub const OID_SECP256K1: &str = "1.3.132.0.10";

/// Short Weierstrass (or, for curve25519, Montgomery) domain parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParameters {
    pub p: BigUint,
    pub a: BigUint,
    pub b: BigUint,
    pub gx: BigUint,
    pub gy: BigUint,
    pub n: BigUint,
    pub h: BigUint,
}

impl CurveParameters {
    /// Field size in bits.
    pub fn field_bits(&self) -> usize {
        self.p.bits() as usize
    }

    /// Field element width in bytes.
    pub fn field_len(&self) -> usize {
        self.field_bits().div_ceil(8)
    }
}

#[derive(Debug, Clone)]
pub struct Curve {
    pub name: &'static str,
    /// Named curve OID, absent for curves only encoded with explicit parameters
    pub oid: Option<&'static str>,
    pub parameters: CurveParameters,
}

struct HexCurve {
    name: &'static str,
    oid: Option<&'static str>,
    p: &'static str,
    a: &'static str,
    b: &'static str,
    gx: &'static str,
    gy: &'static str,
    n: &'static str,
    h: &'static str,
}

const P256_P: &str = "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF";
const P256_A: &str = "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFC";
const P256_B: &str = "5AC635D8AA3A93E7B3EBBD55769886BC651D06B0CC53B0F63BCE3C3E27D2604B";
const P256_GX: &str = "6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296";
const P256_GY: &str = "4FE342E2FE1A7F9B8EE7EB4A7C0F9E162BCE33576B315ECECBB6406837BF51F5";
const P256_N: &str = "FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551";

const P384_P: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFF";
const P384_A: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFFFF0000000000000000FFFFFFFC";
const P384_B: &str = "B3312FA7E23EE7E4988E056BE3F82D19181D9C6EFE8141120314088F5013875AC656398D8A2ED19D2A85C8EDD3EC2AEF";
const P384_GX: &str = "AA87CA22BE8B05378EB1C71EF320AD746E1D3B628BA79B9859F741E082542A385502F25DBF55296C3A545E3872760AB7";
const P384_GY: &str = "3617DE4A96262C6F5D9E98BF9292DC29F8F41DBD289A147CE9DA3113B5F0B8C00A60B1CE1D7E819D7A431D7C90EA0E5F";
const P384_N: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFC7634D81F4372DDF581A0DB248B0A77AECEC196ACCC52973";

const fn p256(name: &'static str) -> HexCurve {
    HexCurve {
        name,
        oid: Some(OID_SECP256R1),
        p: P256_P,
        a: P256_A,
        b: P256_B,
        gx: P256_GX,
        gy: P256_GY,
        n: P256_N,
        h: "1",
    }
}

const fn p384(name: &'static str) -> HexCurve {
    HexCurve {
        name,
        oid: Some(OID_SECP384R1),
        p: P384_P,
        a: P384_A,
        b: P384_B,
        gx: P384_GX,
        gy: P384_GY,
        n: P384_N,
        h: "1",
    }
}

const CURVES: &[HexCurve] = &[
    p256("secp256r1"),
    p256("prime256v1"),
    p256("P-256"),
    p384("secp384r1"),
    p384("P-384"),
    HexCurve {
        name: "secp256k1",
        oid: Some(OID_SECP256K1),
        p: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F",
        a: "0",
        b: "7",
        gx: "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798",
        gy: "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8",
        n: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
        h: "1",
    },
    // Montgomery form y^2 = x^3 + A x^2 + x with A in `a` and B in `b`
    HexCurve {
        name: CURVE25519,
        oid: None,
        p: "7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFED",
        a: "76D06",
        b: "1",
        gx: "9",
        gy: "20AE19A1B8A086B4E01EDD2C7748D14C923D4D7E6D7C61B229E9C5A27ECED3D9",
        n: "1000000000000000000000000000000014DEF9DEA2F79CD65812631A5CF5D3ED",
        h: "8",
    },
];

const SYNONYMS: &[&[&str]] = &[
    &["secp256r1", "prime256v1", "P-256"],
    &["secp384r1", "P-384"],
];

fn hex(value: &str) -> BigUint {
    BigUint::parse_bytes(value.as_bytes(), 16).expect("curve table holds valid hex")
}

static TABLE: LazyLock<Vec<Curve>> = LazyLock::new(|| {
    CURVES
        .iter()
        .map(|c| Curve {
            name: c.name,
            oid: c.oid,
            parameters: CurveParameters {
                p: hex(c.p),
                a: hex(c.a),
                b: hex(c.b),
                gx: hex(c.gx),
                gy: hex(c.gy),
                n: hex(c.n),
                h: hex(c.h),
            },
        })
        .collect()
});

pub fn curves() -> &'static [Curve] {
    &TABLE
}

pub fn by_name(name: &str) -> Option<&'static Curve> {
    TABLE.iter().find(|c| c.name == name)
}

/// First table entry registered under the named curve OID.
pub fn by_oid(oid: &str) -> Option<&'static Curve> {
    TABLE.iter().find(|c| c.oid == Some(oid))
}

/// Names sharing the parameters of `name`, `name` included.
pub fn synonyms(name: &str) -> &'static [&'static str] {
    SYNONYMS
        .iter()
        .find(|group| group.iter().any(|n| *n == name))
        .copied()
        .unwrap_or(&[])
}
