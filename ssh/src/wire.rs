//! SSH wire encoding (RFC 4251 section 5) and public-key blobs.

use crate::error::{Error, Result};

pub const SSH_RSA: &str = "ssh-rsa";
pub const SSH_DSS: &str = "ssh-dss";
pub const ECDSA_NISTP256: &str = "ecdsa-sha2-nistp256";
pub const ECDSA_NISTP384: &str = "ecdsa-sha2-nistp384";

#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn put_string(&mut self, data: &[u8]) -> &mut Self {
        self.put_u32(data.len() as u32);
        self.put_bytes(data)
    }

    /// `mpint` from an unsigned big-endian magnitude.
    pub fn put_mpint(&mut self, magnitude: &[u8]) -> &mut Self {
        let start = magnitude
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(magnitude.len());
        let trimmed = &magnitude[start..];
        if trimmed.first().is_some_and(|b| b & 0x80 != 0) {
            self.put_u32(trimmed.len() as u32 + 1);
            self.buf.push(0);
            self.put_bytes(trimmed)
        } else {
            self.put_string(trimmed)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.data.len() < n {
            return Err(Error::Truncated);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn get_string(&mut self) -> Result<&'a [u8]> {
        let len = self.get_u32()? as usize;
        self.take(len)
    }

    pub fn get_utf8(&mut self) -> Result<String> {
        let raw = self.get_string()?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| Error::InvalidOpenSsh("string is not UTF-8".to_string()))
    }

    /// `mpint` as an unsigned magnitude; negative values are rejected.
    pub fn get_mpint(&mut self) -> Result<Vec<u8>> {
        let raw = self.get_string()?;
        if raw.first().is_some_and(|b| b & 0x80 != 0) {
            return Err(Error::InvalidOpenSsh("negative mpint".to_string()));
        }
        let start = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
        Ok(raw[start..].to_vec())
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The elliptic curves OpenSSH knows by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshCurve {
    NistP256,
    NistP384,
}

impl SshCurve {
    pub fn identifier(&self) -> &'static str {
        match self {
            SshCurve::NistP256 => "nistp256",
            SshCurve::NistP384 => "nistp384",
        }
    }

    pub fn key_type(&self) -> &'static str {
        match self {
            SshCurve::NistP256 => ECDSA_NISTP256,
            SshCurve::NistP384 => ECDSA_NISTP384,
        }
    }

    fn from_identifier(id: &str) -> Result<Self> {
        match id {
            "nistp256" => Ok(SshCurve::NistP256),
            "nistp384" => Ok(SshCurve::NistP384),
            other => Err(Error::UnsupportedKeyType(format!("ecdsa-sha2-{other}"))),
        }
    }
}

/// Public key components, magnitudes are unsigned big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyBlob {
    Rsa {
        e: Vec<u8>,
        n: Vec<u8>,
    },
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
    Ecdsa {
        curve: SshCurve,
        /// SEC1 encoded point
        point: Vec<u8>,
    },
}

impl PublicKeyBlob {
    pub fn key_type(&self) -> &'static str {
        match self {
            PublicKeyBlob::Rsa { .. } => SSH_RSA,
            PublicKeyBlob::Dsa { .. } => SSH_DSS,
            PublicKeyBlob::Ecdsa { curve, .. } => curve.key_type(),
        }
    }

    pub(crate) fn write_fields(&self, w: &mut Writer) {
        match self {
            PublicKeyBlob::Rsa { e, n } => {
                w.put_mpint(e).put_mpint(n);
            }
            PublicKeyBlob::Dsa { p, q, g, y } => {
                w.put_mpint(p).put_mpint(q).put_mpint(g).put_mpint(y);
            }
            PublicKeyBlob::Ecdsa { curve, point } => {
                w.put_string(curve.identifier().as_bytes()).put_string(point);
            }
        }
    }

    pub(crate) fn read_fields(key_type: &str, r: &mut Reader<'_>) -> Result<Self> {
        match key_type {
            SSH_RSA => {
                let e = r.get_mpint()?;
                let n = r.get_mpint()?;
                Ok(PublicKeyBlob::Rsa { e, n })
            }
            SSH_DSS => {
                let p = r.get_mpint()?;
                let q = r.get_mpint()?;
                let g = r.get_mpint()?;
                let y = r.get_mpint()?;
                Ok(PublicKeyBlob::Dsa { p, q, g, y })
            }
            ECDSA_NISTP256 | ECDSA_NISTP384 => {
                let curve = SshCurve::from_identifier(&r.get_utf8()?)?;
                if curve.key_type() != key_type {
                    return Err(Error::InvalidOpenSsh(format!(
                        "curve {} does not match key type {key_type}",
                        curve.identifier()
                    )));
                }
                let point = r.get_string()?.to_vec();
                Ok(PublicKeyBlob::Ecdsa { curve, point })
            }
            other => Err(Error::UnsupportedKeyType(other.to_string())),
        }
    }

    /// Wire encoding: key type string followed by the key fields.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_string(self.key_type().as_bytes());
        self.write_fields(&mut w);
        w.into_bytes()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let key_type = r.get_utf8()?;
        let blob = Self::read_fields(&key_type, &mut r)?;
        if !r.is_empty() {
            return Err(Error::InvalidOpenSsh(format!(
                "{} trailing bytes in public key blob",
                r.remaining().len()
            )));
        }
        Ok(blob)
    }
}
