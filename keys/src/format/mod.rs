//! Key text and binary formats.
//!
//! DER is the root representation; every other format is produced from the
//! DER content of a key and read back into it.

mod ssh;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use kagi::decoder::Decoder;
use kagi_pem::{Label, Pem};
use kagi_ssh::openssh::{self, OpenSshPrivateKey};
use kagi_ssh::ssh2;
use log::debug;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::model::AsymmetricKey;
use crate::parser::parse_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    Der,
    Pem,
    /// Public key line or `openssh-key-v1` private key
    OpenSsh,
    /// RFC 4716 public key
    Ssh2,
}

impl KeyFormat {
    pub const ALL: [KeyFormat; 4] = [KeyFormat::Der, KeyFormat::Pem, KeyFormat::OpenSsh, KeyFormat::Ssh2];

    /// File extension used when writing this format.
    pub fn extension(&self) -> &'static str {
        match self {
            KeyFormat::Der => "der",
            KeyFormat::Pem => "pem",
            KeyFormat::OpenSsh => "ssh",
            KeyFormat::Ssh2 => "ssh2",
        }
    }

    pub fn is_ssh(&self) -> bool {
        matches!(self, KeyFormat::OpenSsh | KeyFormat::Ssh2)
    }
}

impl Display for KeyFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KeyFormat::Der => "der",
            KeyFormat::Pem => "pem",
            KeyFormat::OpenSsh => "openssh",
            KeyFormat::Ssh2 => "ssh2",
        };
        write!(f, "{name}")
    }
}

impl FromStr for KeyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "der" => Ok(KeyFormat::Der),
            "pem" => Ok(KeyFormat::Pem),
            "openssh" | "ssh" => Ok(KeyFormat::OpenSsh),
            "ssh2" => Ok(KeyFormat::Ssh2),
            other => Err(Error::argument(format!("unsupported key format: {other}"))),
        }
    }
}

/// Armors DER bytes under `label`.
pub fn get_as_text(binary: &[u8], label: Label) -> String {
    Pem::from_bytes(label, binary).to_string()
}

/// Inverse of [`get_as_text`].
pub fn get_as_binary(text: &str) -> Result<Vec<u8>> {
    let pem: Pem = text.parse()?;
    Ok(pem.decode()?)
}

/// Armor label matching the role of a key.
pub fn label_for(key: &AsymmetricKey) -> Label {
    if key.is_encrypted() {
        Label::EncryptedPrivateKey
    } else if key.is_private_key() {
        Label::PrivateKey
    } else {
        Label::PublicKey
    }
}

/// Guesses the format of raw key bytes. Anything unrecognised is DER.
pub fn detect(bytes: &[u8]) -> KeyFormat {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return KeyFormat::Der;
    };
    if kagi_pem::is_armored(text) {
        match text.parse::<Pem>() {
            Ok(pem) if pem.label() == Label::OpenSshPrivateKey => KeyFormat::OpenSsh,
            _ => KeyFormat::Pem,
        }
    } else if ssh2::is_ssh2(text) {
        KeyFormat::Ssh2
    } else if openssh::is_public_key_line(text) {
        KeyFormat::OpenSsh
    } else {
        KeyFormat::Der
    }
}

fn as_text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::argument(format!("key text is not UTF-8: {e}")))
}

/// Reads a key in any supported format, returning the format it was in.
pub fn decode_key(bytes: &[u8]) -> Result<(KeyFormat, AsymmetricKey)> {
    let format = detect(bytes);
    debug!("detected {format} key input");
    let key = match format {
        KeyFormat::Der => parse_key(bytes)?,
        KeyFormat::Pem => parse_key(&get_as_binary(as_text(bytes)?)?)?,
        KeyFormat::OpenSsh => {
            let text = as_text(bytes)?;
            if kagi_pem::is_armored(text) {
                ssh::private_from_fields(&OpenSshPrivateKey::from_armored(text)?.key)?
            } else {
                ssh::public_from_blob(&openssh::parse_public_key_line(text)?.0)?
            }
        }
        KeyFormat::Ssh2 => ssh::public_from_blob(&ssh2::decode(as_text(bytes)?)?.0)?,
    };
    Ok((format, key))
}

/// `4096-bit RSA`
fn comment(key: &AsymmetricKey) -> String {
    format!("{}-bit {}", key.key_size(), key.cipher_type())
}

/// Renders a key in `format`.
pub fn encode_key(key: &AsymmetricKey, format: KeyFormat) -> Result<Vec<u8>> {
    debug!("encoding {key} as {format}");
    if format.is_ssh() {
        ssh::ensure_supported(key)?;
    }
    match format {
        KeyFormat::Der => Ok(key.content().to_vec()),
        KeyFormat::Pem => Ok(get_as_text(key.content(), label_for(key)).into_bytes()),
        KeyFormat::OpenSsh if key.is_encrypted() => Err(Error::argument(
            "encrypted keys cannot be written in OpenSSH format",
        )),
        KeyFormat::OpenSsh if key.is_private_key() => {
            let container = OpenSshPrivateKey::new(ssh::private_fields(key)?, comment(key));
            Ok(container.to_armored(OsRng.next_u32()).into_bytes())
        }
        KeyFormat::OpenSsh => {
            let line = openssh::public_key_line(&ssh::public_blob(key)?, &comment(key));
            Ok(format!("{line}\n").into_bytes())
        }
        KeyFormat::Ssh2 if key.is_private_key() => Err(Error::invalid_operation(
            "SSH2 holds public keys only",
        )),
        KeyFormat::Ssh2 => Ok(ssh2::encode(&ssh::public_blob(key)?, &comment(key)).into_bytes()),
    }
}
