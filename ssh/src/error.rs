use base64::DecodeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of SSH wire data")]
    Truncated,

    #[error("unsupported SSH key type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid OpenSSH text: {0}")]
    InvalidOpenSsh(String),

    #[error("invalid SSH2 text: {0}")]
    InvalidSsh2(String),

    /// Encrypted openssh-key-v1 containers are not read
    #[error("encrypted OpenSSH private keys are not supported (cipher {0})")]
    EncryptedPrivateKey(String),

    #[error("OpenSSH private key check integers differ")]
    CheckIntMismatch,

    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),

    #[error("armor: {0}")]
    Pem(#[from] kagi_pem::error::Error),
}
