use std::path::{Path, PathBuf};

use clap::Args;
use kagi_keys::KeyFormat;
use kagi_keys::pbe::PbeScheme;

use crate::args::{Encryption, Format};
use crate::error::{Error, Result};
use crate::key_io::{ReadKey, WriteKey};
use crate::pipeline::{Command, Handler, Pipeline, Services};

#[derive(Args, Debug, Clone)]
pub(crate) struct Config {
    /// Private key to convert
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Public key to convert
    #[arg(long)]
    public_key: Option<PathBuf>,

    /// Target format
    #[arg(long, value_enum)]
    to: Option<Format>,

    /// Password of an encrypted private key, or to encrypt it with
    #[arg(long)]
    password: Option<String>,

    /// Encrypt the converted private key with this scheme
    #[arg(long, value_enum)]
    encryption: Option<Encryption>,
}

pub(crate) struct Convert {
    config: Config,
}

impl Convert {
    fn password(&self) -> Option<&str> {
        self.config.password.as_deref().filter(|p| !p.is_empty())
    }

    fn check(&self) -> Result<()> {
        if self.config.private_key.is_none() && self.config.public_key.is_none() {
            return Err(Error::argument("no keys to convert, pass --private-key or --public-key"));
        }
        let Some(target) = self.config.to.map(KeyFormat::from) else {
            return Err(Error::argument("no target format, pass --to"));
        };
        if self.config.encryption.is_some() {
            if self.password().is_none() {
                return Err(Error::argument("--encryption requires --password"));
            }
            if target.is_ssh() {
                return Err(Error::argument(format!("encrypted keys cannot be written as {target}")));
            }
        }
        Ok(())
    }
}

/// `key.pem` -> `key.<ext>`; `<stem>.converted.<ext>` when that is the
/// source path itself.
pub(crate) fn output_path(source: &Path, target: KeyFormat) -> PathBuf {
    let path = source.with_extension(target.extension());
    if path != source {
        return path;
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}.converted.{}", target.extension()))
}

#[derive(Default)]
pub(crate) struct ConvertHandler;

impl Handler<Convert> for ConvertHandler {
    fn handle(&self, command: &mut Convert, pipeline: &Pipeline<'_>) -> Result<()> {
        let Some(target) = command.config.to.map(KeyFormat::from) else {
            return Err(Error::argument("no target format, pass --to"));
        };
        let encryption = command.config.encryption.map(PbeScheme::from);
        let sources = [
            (command.config.private_key.as_ref(), command.password()),
            (command.config.public_key.as_ref(), None),
        ];

        let mut writes = Vec::new();
        for (source, password) in sources {
            let Some(source) = source else {
                continue;
            };
            let loaded = ReadKey::new(source, password.map(str::to_string)).load(pipeline)?;
            let encrypting = encryption.is_some() && loaded.key.is_private_key();
            if loaded.format == target && !encrypting && !loaded.decrypted {
                return Err(Error::invalid_operation(format!(
                    "{} is already in {target} format",
                    source.display()
                )));
            }

            let mut write = WriteKey::new(loaded.key, target, Some(output_path(source, target))).deferred();
            if let Some(scheme) = encryption {
                write = write.encrypted(password, scheme);
            }
            writes.push((source, write));
        }

        // both keys are encoded before either file is written
        for (_, write) in writes.iter_mut() {
            pipeline.run(write)?;
        }
        for (source, mut write) in writes {
            write.commit(pipeline)?;
            if let Some(destination) = write.path() {
                pipeline.console().write_line(&format!(
                    "converted {} to {}",
                    source.display(),
                    destination.display()
                ))?;
            }
        }
        Ok(())
    }
}

impl Command for Convert {
    type Handler = ConvertHandler;

    fn name(&self) -> &'static str {
        "convert"
    }

    fn validate(&self) -> Option<Result<()>> {
        Some(self.check())
    }
}

pub(crate) fn execute(config: Config, services: &Services<'_>) -> Result<()> {
    Pipeline::new(services).run(&mut Convert { config })
}
