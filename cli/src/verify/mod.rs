pub(crate) mod key;
pub(crate) mod signature;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum VerifyCommands {
    /// Check that a public key belongs to a private key
    Key {
        #[command(flatten)]
        config: key::Config,
    },
    /// Check a signature against a public key
    Signature {
        #[command(flatten)]
        config: signature::Config,
    },
}
