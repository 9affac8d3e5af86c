use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{ArgGroup, Args};
use kagi_keys::signature;

use crate::error::Result;
use crate::key_io::ReadKey;
use crate::pipeline::{Command, Handler, Pipeline, Services};

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("content").required(true).args(["file", "input"])))]
pub(crate) struct Config {
    /// Private key to sign with
    #[arg(long)]
    private_key: PathBuf,

    /// Password of an encrypted private key
    #[arg(long)]
    password: Option<String>,

    /// File to sign
    #[arg(long)]
    file: Option<PathBuf>,

    /// Text to sign
    #[arg(long)]
    input: Option<String>,

    /// Where to write the base64 signature. If not specified, prints it
    #[arg(long)]
    signature: Option<PathBuf>,
}

pub(crate) struct CreateSignature {
    config: Config,
}

#[derive(Default)]
pub(crate) struct CreateSignatureHandler;

impl Handler<CreateSignature> for CreateSignatureHandler {
    fn handle(&self, command: &mut CreateSignature, pipeline: &Pipeline<'_>) -> Result<()> {
        let config = &command.config;
        let loaded = ReadKey::new(&config.private_key, config.password.clone()).load(pipeline)?;
        let content = match (&config.file, &config.input) {
            (Some(file), _) => pipeline.file_system().read_all_bytes(file)?,
            (None, input) => input.clone().unwrap_or_default().into_bytes(),
        };

        let signer = signature::get_for_signing(&loaded.key, config.password.as_deref())?;
        let encoded = STANDARD.encode(signer.sign(&content)?.signed_data());
        match &config.signature {
            Some(path) => {
                pipeline.file_system().write_all_text(path, &encoded)?;
                pipeline.console().write_line(&format!(
                    "wrote {} signature to {}",
                    signer.algorithm(),
                    path.display()
                ))
            }
            None => pipeline.console().write_line(&encoded),
        }
    }
}

impl Command for CreateSignature {
    type Handler = CreateSignatureHandler;

    fn name(&self) -> &'static str {
        "create signature"
    }
}

pub(crate) fn execute(config: Config, services: &Services<'_>) -> Result<()> {
    Pipeline::new(services).run(&mut CreateSignature { config })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use kagi_keys::format::{KeyFormat, encode_key};
    use kagi_keys::pbe::{self, PbeConfig, PbeScheme};
    use kagi_keys::provider::{KeySpec, create_key_pair};
    use kagi_keys::{AsymmetricKeyPair, Signature};

    use super::*;
    use crate::error::Error;
    use crate::io::memory::{MemoryConsole, MemoryFileSystem};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    fn setup(file_system: &MemoryFileSystem, encrypted: bool) -> AsymmetricKeyPair {
        let pair = create_key_pair(&KeySpec::Ec { curve: "P-256".to_string() }).unwrap();
        let private = if encrypted {
            let config = PbeConfig::new(8, 1).unwrap();
            pbe::encrypt_key(pair.private_key(), "pw", PbeScheme::Pkcs5, &config).unwrap()
        } else {
            pair.private_key().clone()
        };
        file_system.insert("priv.pem", encode_key(&private, KeyFormat::Pem).unwrap());
        file_system.insert("content.txt", "file content");
        pair
    }

    fn run(file_system: &MemoryFileSystem, console: &MemoryConsole, args: &[&str]) -> Result<()> {
        let services = Services {
            console,
            file_system,
            pbe: PbeConfig::default(),
        };
        let mut argv = vec!["kagi", "--private-key", "priv.pem"];
        argv.extend_from_slice(args);
        execute(TestCli::parse_from(argv).config, &services)
    }

    fn verify(pair: &AsymmetricKeyPair, encoded: &str, content: &[u8]) -> bool {
        let signed_data = STANDARD.decode(encoded.trim()).unwrap();
        signature::verify_signature(pair, &Signature::new(signed_data, content.to_vec())).unwrap()
    }

    #[test]
    fn test_sign_input_to_console() {
        let (console, file_system) = (MemoryConsole::default(), MemoryFileSystem::default());
        let pair = setup(&file_system, false);
        run(&file_system, &console, &["--input", "hello"]).unwrap();
        assert!(verify(&pair, &console.text(), b"hello"));
    }

    #[test]
    fn test_sign_file_with_encrypted_key() {
        let (console, file_system) = (MemoryConsole::default(), MemoryFileSystem::default());
        let pair = setup(&file_system, true);
        run(
            &file_system,
            &console,
            &["--password", "pw", "--file", "content.txt", "--signature", "sig"],
        )
        .unwrap();
        let encoded = String::from_utf8(file_system.get("sig").unwrap()).unwrap();
        assert!(verify(&pair, &encoded, b"file content"));
        assert!(console.text().contains("SHA512withECDSA"));
    }

    #[test]
    fn test_encrypted_key_without_password() {
        let (console, file_system) = (MemoryConsole::default(), MemoryFileSystem::default());
        setup(&file_system, true);
        let result = run(&file_system, &console, &["--input", "hello"]);
        assert!(matches!(result, Err(Error::Keys(kagi_keys::Error::Argument(_)))));
    }
}
