pub(crate) mod key;
pub(crate) mod signature;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum CreateCommands {
    /// Generate a key pair
    Key {
        #[command(flatten)]
        config: key::Config,
    },
    /// Sign a file or inline text with a private key
    Signature {
        #[command(flatten)]
        config: signature::Config,
    },
}
