//! SSH key text formats.
//!
//! Only the key encodings are covered: the RFC 4251 wire blob, OpenSSH public
//! key lines, the `openssh-key-v1` private key container and RFC 4716 SSH2
//! public key files. Conversion to and from DER lives in `kagi-keys`.

pub mod error;
pub mod openssh;
pub mod ssh2;
pub mod wire;

pub use error::{Error, Result};
pub use openssh::{OpenSshPrivateKey, PrivateKeyFields};
pub use wire::{PublicKeyBlob, SshCurve};
