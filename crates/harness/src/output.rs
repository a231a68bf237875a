use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarnessError, Result};

/// The append-only `key=value` file CI reads step outputs from.
#[derive(Debug, Clone)]
pub struct GithubOutput {
    path: PathBuf,
}

impl GithubOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a single `key=value` line.
    pub fn emit(&self, key: &str, value: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.sink_error(source))?;

        writeln!(file, "{}={}", key, value).map_err(|source| self.sink_error(source))?;

        info!("Wrote output `{}` to {}", key, self.path.display());
        Ok(())
    }

    /// Appends `key=<value as compact JSON>`.
    pub fn emit_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.emit(key, &json)
    }

    fn sink_error(&self, source: std::io::Error) -> HarnessError {
        HarnessError::Sink {
            path: self.path.clone(),
            source,
        }
    }
}
