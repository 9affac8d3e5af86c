//! Asymmetric key management for kagi.
//!
//! Keys are immutable values over their canonical DER content
//! ([`model::AsymmetricKey`]). The crate generates and loads keys per family
//! ([`provider`]), classifies algorithm identifiers ([`mapper`]), encrypts
//! private keys with a password ([`pbe`]), transcodes between DER, PEM and the
//! SSH formats ([`format`]) and signs and verifies ([`signature`]).

pub mod curve;
pub mod error;
pub mod format;
mod info;
pub mod mapper;
pub mod model;
pub mod parser;
pub mod pbe;
pub mod provider;
pub mod signature;

pub use error::{Error, Result};
pub use format::KeyFormat;
pub use model::{
    AsymmetricKey, AsymmetricKeyPair, CipherType, EcKey, EncryptedKey, KeyData, KeyType, Signature,
};
pub use parser::parse_key;
pub use pbe::{PbeConfig, PbeScheme};
pub use provider::{KeyFamily, KeySpec};
