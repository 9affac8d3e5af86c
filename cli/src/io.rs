//! File and console access used by command handlers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// User-facing output.
pub(crate) trait Console {
    fn write_line(&self, line: &str) -> Result<()>;

    fn write_bytes(&self, bytes: &[u8]) -> Result<()>;
}

pub(crate) trait FileSystem {
    fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    fn read_all_text(&self, path: &Path) -> Result<String> {
        let bytes = self.read_all_bytes(path)?;
        String::from_utf8(bytes).map_err(|e| {
            Error::argument(format!("{} is not UTF-8 text: {e}", path.display()))
        })
    }

    fn write_all_text(&self, path: &Path, text: &str) -> Result<()> {
        self.write_all_bytes(path, text.as_bytes())
    }
}

pub(crate) struct StdConsole;

impl Console for StdConsole {
    fn write_line(&self, line: &str) -> Result<()> {
        writeln!(io::stdout(), "{line}")?;
        Ok(())
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        Ok(())
    }
}

pub(crate) struct LocalFileSystem;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.display().to_string(),
        source,
    }
}

impl FileSystem for LocalFileSystem {
    fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(io_error(path))
    }

    fn write_all_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).map_err(io_error(path))
    }
}
