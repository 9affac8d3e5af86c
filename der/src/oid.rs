use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Error, Result};

/// OBJECT IDENTIFIER as its list of arcs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn arcs(&self) -> &[u64] {
        &self.inner
    }

    pub fn to_der_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();
        if self.inner.len() < 2 {
            return result;
        }
        // first two arcs share one octet
        let first = self.inner[0] * 40 + self.inner[1];
        push_base128(&mut result, first);
        for v in self.inner[2..].iter() {
            push_base128(&mut result, *v);
        }
        result
    }
}

fn push_base128(out: &mut Vec<u8>, value: u64) {
    let mut encoded = vec![(value & 0x7f) as u8];
    let mut value = value >> 7;
    while value > 0 {
        encoded.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out.extend(encoded.iter().rev());
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::InvalidObjectIdentifier("empty".to_string()));
        }

        let mut values = Vec::new();
        let mut val = 0u64;
        let mut pending = false;
        for v in value.iter() {
            val = (val << 7) | (*v as u64 & 0x7f);
            pending = true;
            if *v & 0x80 == 0 {
                if values.is_empty() {
                    let first = val.min(80) / 40;
                    values.push(first);
                    values.push(val - first * 40);
                } else {
                    values.push(val);
                }
                val = 0;
                pending = false;
            }
        }
        if pending {
            return Err(Error::InvalidObjectIdentifier(
                "incomplete encoding".to_string(),
            ));
        }

        Ok(ObjectIdentifier { inner: values })
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .inner
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split('.')
            .map(|arc| {
                arc.parse::<u64>()
                    .map_err(|_| Error::InvalidObjectIdentifier(format!("invalid arc '{arc}'")))
            })
            .collect::<Result<Vec<u64>>>()?;
        if values.len() < 2 {
            return Err(Error::InvalidObjectIdentifier(format!(
                "too few arcs: {s}"
            )));
        }
        Ok(ObjectIdentifier { inner: values })
    }
}

impl PartialEq<&str> for ObjectIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}
