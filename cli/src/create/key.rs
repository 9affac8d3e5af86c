use std::path::PathBuf;

use clap::Args;
use kagi_keys::curve;
use kagi_keys::pbe::PbeScheme;
use kagi_keys::provider::{self, KeySpec, modp};
use kagi_keys::KeyFormat;

use crate::args::{Algorithm, Encryption, Format};
use crate::error::{Error, Result};
use crate::key_io::WriteKey;
use crate::pipeline::{Command, Handler, Pipeline, Services};

pub(crate) const MIN_RSA_KEY_SIZE: usize = 4096;
const DEFAULT_DSA_KEY_SIZE: usize = 2048;
const DEFAULT_ELGAMAL_KEY_SIZE: usize = 2048;

#[derive(Args, Debug, Clone)]
pub(crate) struct Config {
    /// Key algorithm
    #[arg(long, value_enum, default_value_t = Algorithm::Rsa)]
    algorithm: Algorithm,

    /// Key size in bits [default: 4096 for RSA, 2048 for DSA and ElGamal]
    #[arg(long)]
    key_size: Option<usize>,

    /// Curve for EC keys
    #[arg(long, default_value = "secp256r1")]
    curve: String,

    /// Search for a fresh ElGamal safe prime instead of using an RFC 3526 group
    #[arg(long)]
    generate_prime: bool,

    /// Encrypt the private key with this password
    #[arg(long)]
    password: Option<String>,

    /// Encryption scheme for the private key [default: pkcs5 when a password is given]
    #[arg(long, value_enum)]
    encryption: Option<Encryption>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Pem)]
    format: Format,

    /// Where to write the private key
    #[arg(long)]
    private_key: PathBuf,

    /// Where to write the public key
    #[arg(long)]
    public_key: PathBuf,
}

pub(crate) struct CreateKey {
    config: Config,
}

impl CreateKey {
    fn key_size(&self) -> usize {
        match self.config.algorithm {
            Algorithm::Rsa => self.config.key_size.unwrap_or(MIN_RSA_KEY_SIZE),
            Algorithm::Dsa => self.config.key_size.unwrap_or(DEFAULT_DSA_KEY_SIZE),
            Algorithm::Elgamal => self.config.key_size.unwrap_or(DEFAULT_ELGAMAL_KEY_SIZE),
            Algorithm::Ec => 0,
        }
    }

    fn password(&self) -> Option<&str> {
        self.config.password.as_deref().filter(|p| !p.is_empty())
    }

    fn spec(&self) -> Result<KeySpec> {
        let bits = self.key_size();
        Ok(match self.config.algorithm {
            Algorithm::Rsa => KeySpec::Rsa { bits },
            Algorithm::Dsa => KeySpec::Dsa { bits },
            Algorithm::Ec => KeySpec::Ec {
                curve: self.config.curve.clone(),
            },
            Algorithm::Elgamal => KeySpec::ElGamal {
                bits,
                group: match self.config.generate_prime {
                    true => None,
                    false => Some(modp::get_parameters_by_key_size(bits)?),
                },
            },
        })
    }

    fn check(&self) -> Result<()> {
        let format = KeyFormat::from(self.config.format);
        if self.config.encryption.is_some() && self.password().is_none() {
            return Err(Error::argument("--encryption requires --password"));
        }
        if format == KeyFormat::Ssh2 {
            return Err(Error::invalid_operation("SSH2 files hold public keys only"));
        }
        if format.is_ssh() && self.password().is_some() {
            return Err(Error::argument(format!("encrypted keys cannot be written as {format}")));
        }

        let bits = self.key_size();
        match self.config.algorithm {
            Algorithm::Rsa if bits < MIN_RSA_KEY_SIZE => Err(Error::argument(format!(
                "RSA keys must be at least {MIN_RSA_KEY_SIZE} bits, got {bits}"
            ))),
            Algorithm::Dsa if !matches!(bits, 2048 | 3072) => Err(Error::argument(format!(
                "DSA keys must be 2048 or 3072 bits, got {bits}"
            ))),
            Algorithm::Ec if curve::by_name(&self.config.curve).is_none() => Err(Error::argument(
                format!("unsupported curve: {}", self.config.curve),
            )),
            Algorithm::Elgamal if format.is_ssh() => {
                Err(Error::argument("ElGamal keys have no SSH representation"))
            }
            Algorithm::Elgamal
                if !self.config.generate_prime && !modp::standard_key_sizes().any(|s| s == bits) =>
            {
                Err(Error::argument(format!(
                    "no standard ElGamal group of {bits} bits, use --generate-prime"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub(crate) struct CreateKeyHandler;

impl Handler<CreateKey> for CreateKeyHandler {
    fn handle(&self, command: &mut CreateKey, pipeline: &Pipeline<'_>) -> Result<()> {
        let pair = provider::create_key_pair(&command.spec()?)?
            .with_password(command.password().map(str::to_string))?;
        let format = KeyFormat::from(command.config.format);
        let scheme = command
            .config
            .encryption
            .map(PbeScheme::from)
            .unwrap_or(PbeScheme::Pkcs5);

        let (private, public) = pair.clone().into_keys();
        let writes = [
            WriteKey::new(private, format, Some(command.config.private_key.clone()))
                .encrypted(pair.password(), scheme),
            WriteKey::new(public, format, Some(command.config.public_key.clone())),
        ];
        for mut write in writes {
            pipeline.run(&mut write)?;
            if let Some(path) = write.path() {
                pipeline
                    .console()
                    .write_line(&format!("wrote {} to {}", write.key(), path.display()))?;
            }
        }
        Ok(())
    }
}

impl Command for CreateKey {
    type Handler = CreateKeyHandler;

    fn name(&self) -> &'static str {
        "create key"
    }

    fn validate(&self) -> Option<Result<()>> {
        Some(self.check())
    }

    fn long_running_warning(&self) -> Option<String> {
        (self.config.algorithm == Algorithm::Elgamal && self.config.generate_prime).then(|| {
            format!(
                "Generating a {}-bit ElGamal group from fresh safe primes. This can take a long time.",
                self.key_size()
            )
        })
    }
}

pub(crate) fn execute(config: Config, services: &Services<'_>) -> Result<()> {
    Pipeline::new(services).run(&mut CreateKey { config })
}
