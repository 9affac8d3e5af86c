//! Option values shared by several commands.

use clap::ValueEnum;
use kagi_keys::{KeyFamily, KeyFormat, PbeScheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Algorithm {
    Rsa,
    Dsa,
    Ec,
    Elgamal,
}

impl From<Algorithm> for KeyFamily {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Rsa => KeyFamily::Rsa,
            Algorithm::Dsa => KeyFamily::Dsa,
            Algorithm::Ec => KeyFamily::Ec,
            Algorithm::Elgamal => KeyFamily::ElGamal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Der,
    Pem,
    Openssh,
    Ssh2,
}

impl From<Format> for KeyFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Der => KeyFormat::Der,
            Format::Pem => KeyFormat::Pem,
            Format::Openssh => KeyFormat::OpenSsh,
            Format::Ssh2 => KeyFormat::Ssh2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Encryption {
    Pkcs5,
    Pkcs12,
}

impl From<Encryption> for PbeScheme {
    fn from(encryption: Encryption) -> Self {
        match encryption {
            Encryption::Pkcs5 => PbeScheme::Pkcs5,
            Encryption::Pkcs12 => PbeScheme::Pkcs12,
        }
    }
}
