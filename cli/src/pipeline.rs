//! Command execution through a fixed list of stages.
//!
//! Every command runs through the same stages. A stage only touches a command
//! that exposes the matching capability; `before` hooks run in list order
//! ahead of the handler and `after` hooks in reverse order behind it:
//!
//! ```text
//! Validation.before
//!   LongRunningWarning.before
//!     ...
//!       Encoding.before
//!         handler
//!       Encoding.after
//!     ...
//!   LongRunningWarning.after
//! Validation.after
//! ```
//!
//! A read command therefore has its raw bytes parsed and then decrypted
//! after the handler loaded them, and a write command has its key encrypted
//! and then encoded before the handler emits it.

use std::fmt::{Display, Formatter};

use kagi_keys::format::{KeyFormat, decode_key, encode_key};
use kagi_keys::pbe::{self, PbeConfig, PbeScheme};
use kagi_keys::AsymmetricKey;
use log::debug;

use crate::error::{Error, Result};
use crate::io::{Console, FileSystem};

/// Collaborators shared by every command, built once in `main`.
pub(crate) struct Services<'a> {
    pub(crate) console: &'a dyn Console,
    pub(crate) file_system: &'a dyn FileSystem,
    pub(crate) pbe: PbeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Validation,
    LongRunningWarning,
    Decryption,
    FormatDetection,
    Encryption,
    Encoding,
}

impl Stage {
    /// Nesting order, outermost first.
    pub(crate) const ORDER: [Stage; 6] = [
        Stage::Validation,
        Stage::LongRunningWarning,
        Stage::Decryption,
        Stage::FormatDetection,
        Stage::Encryption,
        Stage::Encoding,
    ];
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::LongRunningWarning => "long-running warning",
            Stage::Decryption => "decryption",
            Stage::FormatDetection => "format detection",
            Stage::Encryption => "encryption",
            Stage::Encoding => "encoding",
        };
        write!(f, "{name}")
    }
}

/// Key bytes on their way in.
#[derive(Debug, Default)]
pub(crate) struct ReadSlot {
    /// Raw input, filled by the handler
    pub(crate) raw: Option<Vec<u8>>,
    pub(crate) password: Option<String>,
    pub(crate) format: Option<KeyFormat>,
    pub(crate) key: Option<AsymmetricKey>,
    /// The key was encrypted on input and has been decrypted
    pub(crate) decrypted: bool,
}

impl ReadSlot {
    pub(crate) fn with_password(password: Option<String>) -> Self {
        ReadSlot {
            password,
            ..ReadSlot::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncryptionRequest {
    pub(crate) scheme: PbeScheme,
    pub(crate) password: String,
}

/// Key on its way out.
#[derive(Debug)]
pub(crate) struct WriteSlot {
    pub(crate) key: AsymmetricKey,
    pub(crate) format: KeyFormat,
    pub(crate) encryption: Option<EncryptionRequest>,
    /// Encoded output, consumed when the key is written
    pub(crate) output: Option<Vec<u8>>,
}

impl WriteSlot {
    pub(crate) fn new(key: AsymmetricKey, format: KeyFormat, encryption: Option<EncryptionRequest>) -> Self {
        WriteSlot {
            key,
            format,
            encryption,
            output: None,
        }
    }
}

pub(crate) trait Command: Sized {
    type Handler: Handler<Self> + Default;

    fn name(&self) -> &'static str;

    fn validate(&self) -> Option<Result<()>> {
        None
    }

    fn long_running_warning(&self) -> Option<String> {
        None
    }

    fn read_slot(&mut self) -> Option<&mut ReadSlot> {
        None
    }

    fn write_slot(&mut self) -> Option<&mut WriteSlot> {
        None
    }
}

pub(crate) trait Handler<C: Command> {
    fn handle(&self, command: &mut C, pipeline: &Pipeline<'_>) -> Result<()>;
}

pub(crate) struct Pipeline<'a> {
    services: &'a Services<'a>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(services: &'a Services<'a>) -> Self {
        Pipeline { services }
    }

    pub(crate) fn console(&self) -> &dyn Console {
        self.services.console
    }

    pub(crate) fn file_system(&self) -> &dyn FileSystem {
        self.services.file_system
    }

    /// Runs `command` through every stage and its handler, stopping at the
    /// first error.
    pub(crate) fn run<C: Command>(&self, command: &mut C) -> Result<()> {
        for stage in Stage::ORDER {
            debug!("{}: {stage} before", command.name());
            self.before(stage, command)?;
        }
        debug!("{}: handler", command.name());
        C::Handler::default().handle(command, self)?;
        for stage in Stage::ORDER.into_iter().rev() {
            debug!("{}: {stage} after", command.name());
            self.after(stage, command)?;
        }
        Ok(())
    }

    fn before<C: Command>(&self, stage: Stage, command: &mut C) -> Result<()> {
        match stage {
            Stage::Validation => command.validate().unwrap_or(Ok(())),
            Stage::LongRunningWarning => match command.long_running_warning() {
                Some(warning) => self.console().write_line(&warning),
                None => Ok(()),
            },
            Stage::Encryption => match command.write_slot() {
                Some(slot) => self.encrypt(slot),
                None => Ok(()),
            },
            Stage::Encoding => match command.write_slot() {
                Some(slot) => {
                    slot.output = Some(encode_key(&slot.key, slot.format)?);
                    Ok(())
                }
                None => Ok(()),
            },
            Stage::Decryption | Stage::FormatDetection => Ok(()),
        }
    }

    fn after<C: Command>(&self, stage: Stage, command: &mut C) -> Result<()> {
        match stage {
            Stage::FormatDetection => match command.read_slot() {
                Some(slot) => detect(slot),
                None => Ok(()),
            },
            Stage::Decryption => match command.read_slot() {
                Some(slot) => decrypt(slot),
                None => Ok(()),
            },
            Stage::Validation | Stage::LongRunningWarning | Stage::Encryption | Stage::Encoding => {
                Ok(())
            }
        }
    }

    fn encrypt(&self, slot: &mut WriteSlot) -> Result<()> {
        let Some(request) = &slot.encryption else {
            return Ok(());
        };
        slot.key = pbe::encrypt_key(&slot.key, &request.password, request.scheme, &self.services.pbe)?;
        Ok(())
    }
}

fn detect(slot: &mut ReadSlot) -> Result<()> {
    let raw = slot
        .raw
        .as_deref()
        .ok_or_else(|| Error::invalid_operation("no key input was read"))?;
    let (format, key) = decode_key(raw)?;
    debug!("read {key} in {format} format");
    slot.format = Some(format);
    slot.key = Some(key);
    Ok(())
}

fn decrypt(slot: &mut ReadSlot) -> Result<()> {
    let (Some(key), Some(password)) = (&slot.key, slot.password.as_deref()) else {
        return Ok(());
    };
    if !key.is_encrypted() || password.is_empty() {
        return Ok(());
    }
    slot.key = Some(pbe::decrypt_key(key, password)?);
    slot.decrypted = true;
    Ok(())
}
