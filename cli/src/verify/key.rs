use std::path::PathBuf;

use clap::Args;
use kagi_keys::AsymmetricKeyPair;
use kagi_keys::provider;

use crate::error::{Error, Result};
use crate::key_io::ReadKey;
use crate::pipeline::{Command, Handler, Pipeline, Services};

#[derive(Args, Debug, Clone)]
pub(crate) struct Config {
    #[arg(long)]
    private_key: PathBuf,

    #[arg(long)]
    public_key: PathBuf,

    /// Password of an encrypted private key
    #[arg(long)]
    password: Option<String>,
}

pub(crate) struct VerifyKey {
    config: Config,
}

#[derive(Default)]
pub(crate) struct VerifyKeyHandler;

impl Handler<VerifyKey> for VerifyKeyHandler {
    fn handle(&self, command: &mut VerifyKey, pipeline: &Pipeline<'_>) -> Result<()> {
        let config = &command.config;
        let private = ReadKey::new(&config.private_key, config.password.clone()).load(pipeline)?;
        let public = ReadKey::new(&config.public_key, None).load(pipeline)?;
        if private.key.is_encrypted() {
            return Err(Error::argument("the private key is encrypted, pass --password"));
        }

        let pair = AsymmetricKeyPair::new(private.key, public.key);
        if !provider::verify_key_pair(&pair)? {
            return Err(Error::cryptographic(format!(
                "{} does not belong to {}",
                config.public_key.display(),
                config.private_key.display()
            )));
        }
        pipeline.console().write_line(&format!(
            "{} matches {}",
            pair.public_key(),
            pair.private_key()
        ))
    }
}

impl Command for VerifyKey {
    type Handler = VerifyKeyHandler;

    fn name(&self) -> &'static str {
        "verify key"
    }
}

pub(crate) fn execute(config: Config, services: &Services<'_>) -> Result<()> {
    Pipeline::new(services).run(&mut VerifyKey { config })
}

#[cfg(test)]
mod tests {
    use kagi_keys::format::{KeyFormat, encode_key};
    use kagi_keys::pbe::{self, PbeConfig, PbeScheme};
    use kagi_keys::provider::{KeySpec, create_key_pair};

    use super::*;
    use crate::io::memory::{MemoryConsole, MemoryFileSystem};

    fn run(file_system: &MemoryFileSystem, password: Option<&str>) -> (Result<()>, String) {
        let console = MemoryConsole::default();
        let services = Services {
            console: &console,
            file_system,
            pbe: PbeConfig::default(),
        };
        let config = Config {
            private_key: "priv".into(),
            public_key: "pub".into(),
            password: password.map(str::to_string),
        };
        let result = execute(config, &services);
        (result, console.text())
    }

    fn store(file_system: &MemoryFileSystem, spec: KeySpec) -> kagi_keys::AsymmetricKeyPair {
        let pair = create_key_pair(&spec).unwrap();
        file_system.insert("priv", encode_key(pair.private_key(), KeyFormat::Pem).unwrap());
        file_system.insert("pub", encode_key(pair.public_key(), KeyFormat::OpenSsh).unwrap());
        pair
    }

    #[test]
    fn test_matching_pair() {
        let file_system = MemoryFileSystem::default();
        store(&file_system, KeySpec::Ec { curve: "P-384".to_string() });
        let (result, text) = run(&file_system, None);
        result.unwrap();
        assert!(text.contains("matches"));
    }

    #[test]
    fn test_mismatched_pair() {
        let file_system = MemoryFileSystem::default();
        store(&file_system, KeySpec::Ec { curve: "P-256".to_string() });
        let other = create_key_pair(&KeySpec::Ec { curve: "P-256".to_string() }).unwrap();
        file_system.insert("pub", encode_key(other.public_key(), KeyFormat::Der).unwrap());
        let (result, _) = run(&file_system, None);
        assert!(matches!(result, Err(Error::Keys(kagi_keys::Error::Cryptographic(_)))));
    }

    #[test]
    fn test_encrypted_private_key() {
        let file_system = MemoryFileSystem::default();
        let pair = store(&file_system, KeySpec::Ec { curve: "P-256".to_string() });
        let config = PbeConfig::new(8, 1).unwrap();
        let sealed = pbe::encrypt_key(pair.private_key(), "pw", PbeScheme::Pkcs12, &config).unwrap();
        file_system.insert("priv", encode_key(&sealed, KeyFormat::Der).unwrap());

        let (result, _) = run(&file_system, None);
        assert!(matches!(result, Err(Error::Keys(kagi_keys::Error::Argument(_)))));
        let (result, _) = run(&file_system, Some("pw"));
        result.unwrap();
    }
}
