//! Sub-commands that load and store a single key.

use std::path::{Path, PathBuf};

use kagi_keys::format::KeyFormat;
use kagi_keys::pbe::PbeScheme;
use kagi_keys::AsymmetricKey;

use crate::error::{Error, Result};
use crate::pipeline::{Command, EncryptionRequest, Handler, Pipeline, ReadSlot, WriteSlot};

/// Loads a key from a file, decrypting it when a password is given.
pub(crate) struct ReadKey {
    path: PathBuf,
    slot: ReadSlot,
}

/// A key as loaded by [`ReadKey`].
#[derive(Debug)]
pub(crate) struct LoadedKey {
    pub(crate) key: AsymmetricKey,
    pub(crate) format: KeyFormat,
    pub(crate) decrypted: bool,
}

impl ReadKey {
    pub(crate) fn new(path: impl Into<PathBuf>, password: Option<String>) -> Self {
        ReadKey {
            path: path.into(),
            slot: ReadSlot::with_password(password),
        }
    }

    /// Runs the read and hands back the parsed key.
    pub(crate) fn load(mut self, pipeline: &Pipeline<'_>) -> Result<LoadedKey> {
        pipeline.run(&mut self)?;
        match (self.slot.key, self.slot.format) {
            (Some(key), Some(format)) => Ok(LoadedKey {
                key,
                format,
                decrypted: self.slot.decrypted,
            }),
            _ => Err(Error::invalid_operation(format!(
                "no key was read from {}",
                self.path.display()
            ))),
        }
    }
}

#[derive(Default)]
pub(crate) struct ReadKeyHandler;

impl Handler<ReadKey> for ReadKeyHandler {
    fn handle(&self, command: &mut ReadKey, pipeline: &Pipeline<'_>) -> Result<()> {
        command.slot.raw = Some(pipeline.file_system().read_all_bytes(&command.path)?);
        Ok(())
    }
}

impl Command for ReadKey {
    type Handler = ReadKeyHandler;

    fn name(&self) -> &'static str {
        "read key"
    }

    fn read_slot(&mut self) -> Option<&mut ReadSlot> {
        Some(&mut self.slot)
    }
}

/// Encrypts (optionally) and encodes a key, then writes it to a file or,
/// without a path, to the console.
pub(crate) struct WriteKey {
    path: Option<PathBuf>,
    slot: WriteSlot,
    deferred: bool,
}

impl WriteKey {
    pub(crate) fn new(key: AsymmetricKey, format: KeyFormat, path: Option<PathBuf>) -> Self {
        WriteKey {
            path,
            slot: WriteSlot::new(key, format, None),
            deferred: false,
        }
    }

    /// Private keys are encrypted under `password` with `scheme`; public keys
    /// are written unchanged.
    pub(crate) fn encrypted(mut self, password: Option<&str>, scheme: PbeScheme) -> Self {
        if !self.slot.key.is_private_key() {
            return self;
        }
        self.slot.encryption = password
            .filter(|p| !p.is_empty())
            .map(|password| EncryptionRequest {
                scheme,
                password: password.to_string(),
            });
        self
    }

    /// Runs encryption and encoding only; the output is emitted by
    /// [`WriteKey::commit`].
    pub(crate) fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Emits the output a deferred run encoded.
    pub(crate) fn commit(&mut self, pipeline: &Pipeline<'_>) -> Result<()> {
        let output = self
            .slot
            .output
            .take()
            .ok_or_else(|| Error::invalid_operation("key was not encoded"))?;
        match &self.path {
            Some(path) => pipeline.file_system().write_all_bytes(path, &output),
            None => pipeline.console().write_bytes(&output),
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Key as written, after encryption.
    pub(crate) fn key(&self) -> &AsymmetricKey {
        &self.slot.key
    }
}

#[derive(Default)]
pub(crate) struct WriteKeyHandler;

impl Handler<WriteKey> for WriteKeyHandler {
    fn handle(&self, command: &mut WriteKey, pipeline: &Pipeline<'_>) -> Result<()> {
        if command.deferred {
            return Ok(());
        }
        command.commit(pipeline)
    }
}

impl Command for WriteKey {
    type Handler = WriteKeyHandler;

    fn name(&self) -> &'static str {
        "write key"
    }

    fn write_slot(&mut self) -> Option<&mut WriteSlot> {
        Some(&mut self.slot)
    }
}
