//! Subcommand handlers.

pub mod decode;
pub mod encode;
pub mod merge;
pub mod prune;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use elvn_core::config::{self, SyncConfig};
use elvn_core::error::ErrorCode;
use elvn_core::journal::{self, JournalError, JournalScan};
use serde::Serialize;

use crate::output::{CliError, OutputMode, render_error};

/// Data directory and config for commands that touch the device journal.
#[derive(Debug, Clone)]
pub struct JournalContext {
    pub base: PathBuf,
    pub config: SyncConfig,
}

impl JournalContext {
    /// Resolve the data directory and load the config.
    ///
    /// An explicit `--config` path replaces `<base>/sync.toml`.
    pub fn load(output: OutputMode, config_path: Option<&Path>) -> anyhow::Result<Self> {
        let base = config::base_dir()?;
        let loaded = match config_path {
            Some(path) => config::load_config_file(path),
            None => config::load_sync_config(&base),
        };
        let config = match loaded {
            Ok(config) => config,
            Err(e) => {
                render_error(
                    output,
                    &CliError::coded(ErrorCode::ConfigParseError, format!("{e:#}")),
                )?;
                return Err(e);
            }
        };
        Ok(Self { base, config })
    }

    pub fn journal_path(&self) -> PathBuf {
        self.config.journal.journal_path(&self.base)
    }
}

/// Render a journal failure with its error code, then hand it back.
pub fn journal_failure(output: OutputMode, err: JournalError) -> anyhow::Error {
    let rendered = render_error(output, &CliError::coded(err.code(), err.to_string()));
    match rendered {
        Ok(()) => err.into(),
        Err(render_err) => render_err.context(err.to_string()),
    }
}

/// Read a journal file, rendering the failure when it cannot be read.
pub fn read_journal_file(output: OutputMode, path: &Path) -> anyhow::Result<JournalScan> {
    journal::read_journal(path)
        .map_err(|e| journal_failure(output, e))
        .with_context(|| format!("while reading {}", path.display()))
}

/// A journal line that failed to decode, as shown to the user.
#[derive(Debug, Serialize)]
pub struct SkippedView {
    pub line: usize,
    pub code: &'static str,
    pub error: String,
    pub raw: String,
}

impl SkippedView {
    pub fn from_scan(scan: &JournalScan) -> Vec<Self> {
        scan.skipped
            .iter()
            .map(|s| Self {
                line: s.line,
                code: s.error.code().code(),
                error: s.error.to_string(),
                raw: s.raw.clone(),
            })
            .collect()
    }
}
