use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{ArgGroup, Args};
use kagi_keys::{Signature, signature};

use crate::error::{Error, Result};
use crate::key_io::ReadKey;
use crate::pipeline::{Command, Handler, Pipeline, Services};

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("content").required(true).args(["file", "input"])))]
#[command(group(ArgGroup::new("signed").required(true).args(["signature", "signature_input"])))]
pub(crate) struct Config {
    /// Public key to verify with
    #[arg(long)]
    public_key: PathBuf,

    /// Signed file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Signed text
    #[arg(long)]
    input: Option<String>,

    /// File holding the base64 signature
    #[arg(long)]
    signature: Option<PathBuf>,

    /// Base64 signature
    #[arg(long)]
    signature_input: Option<String>,
}

pub(crate) struct VerifySignature {
    config: Config,
}

#[derive(Default)]
pub(crate) struct VerifySignatureHandler;

impl Handler<VerifySignature> for VerifySignatureHandler {
    fn handle(&self, command: &mut VerifySignature, pipeline: &Pipeline<'_>) -> Result<()> {
        let config = &command.config;
        let loaded = ReadKey::new(&config.public_key, None).load(pipeline)?;
        let content = match (&config.file, &config.input) {
            (Some(file), _) => pipeline.file_system().read_all_bytes(file)?,
            (None, input) => input.clone().unwrap_or_default().into_bytes(),
        };
        let encoded = match (&config.signature, &config.signature_input) {
            (Some(path), _) => pipeline.file_system().read_all_text(path)?,
            (None, input) => input.clone().unwrap_or_default(),
        };
        let signed_data = STANDARD.decode(encoded.trim())?;

        let verifier = signature::get_for_verifying(&loaded.key)?;
        if !verifier.verify(&Signature::new(signed_data, content))? {
            return Err(Error::cryptographic(format!(
                "{} signature does not match",
                verifier.algorithm()
            )));
        }
        pipeline
            .console()
            .write_line(&format!("{} signature is valid", verifier.algorithm()))
    }
}

impl Command for VerifySignature {
    type Handler = VerifySignatureHandler;

    fn name(&self) -> &'static str {
        "verify signature"
    }
}

pub(crate) fn execute(config: Config, services: &Services<'_>) -> Result<()> {
    Pipeline::new(services).run(&mut VerifySignature { config })
}

#[cfg(test)]
mod tests {
    use kagi_keys::format::{KeyFormat, encode_key};
    use kagi_keys::pbe::PbeConfig;
    use kagi_keys::provider::{KeySpec, create_key_pair};
    use rstest::rstest;

    use super::*;
    use crate::io::memory::{MemoryConsole, MemoryFileSystem};

    fn config(input: &str, signature_input: &str) -> Config {
        Config {
            public_key: "pub".into(),
            file: None,
            input: Some(input.to_string()),
            signature: None,
            signature_input: Some(signature_input.to_string()),
        }
    }

    #[rstest(spec, format,
        case(KeySpec::Rsa { bits: 1024 }, KeyFormat::Ssh2),
        case(KeySpec::Ec { curve: "secp256k1".to_string() }, KeyFormat::Pem),
    )]
    fn test_verify(spec: KeySpec, format: KeyFormat) {
        let (console, file_system) = (MemoryConsole::default(), MemoryFileSystem::default());
        let services = Services {
            console: &console,
            file_system: &file_system,
            pbe: PbeConfig::default(),
        };
        let pair = create_key_pair(&spec).unwrap();
        file_system.insert("pub", encode_key(pair.public_key(), format).unwrap());
        let signed = signature::create_signature(&pair, b"message").unwrap();
        let encoded = STANDARD.encode(signed.signed_data());

        execute(config("message", &encoded), &services).unwrap();
        assert!(console.text().contains("is valid"));

        let result = execute(config("massage", &encoded), &services);
        assert!(matches!(result, Err(Error::Keys(kagi_keys::Error::Cryptographic(_)))));
        let result = execute(config("message", "not base64!"), &services);
        assert!(matches!(result, Err(Error::Base64(_))));
    }
}
