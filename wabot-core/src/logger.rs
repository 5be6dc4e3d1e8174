//! Tracing setup for the dashboard tools. Command output owns stdout, so logs go to stderr
//! and, when configured, to an append-only log file without ANSI colors.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Where logs go and how verbose they are.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub default_directive: String,
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            default_directive: DEFAULT_DIRECTIVE.to_string(),
            console: true,
        }
    }
}

impl LogConfig {
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Drops the stderr layer; only the file (if any) receives events.
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// `RUST_LOG` wins over the configured default.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

/// Opens `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Open log file {}", path.display()))
}

/// Installs the global subscriber described by `config`. Load `.env` before calling so
/// `RUST_LOG` is honored. Fails if a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let file_layer = match &config.file {
        Some(path) => {
            let file = Arc::new(open_log_file(path)?);
            Some(fmt::layer().with_writer(file).with_ansi(false).with_target(true))
        }
        None => None,
    };
    let console_layer = config
        .console
        .then(|| fmt::layer().with_writer(io::stderr).with_target(false));

    Registry::default()
        .with(config.env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parent_dirs_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("wabot.log");

        {
            use std::io::Write;
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "first").unwrap();
        }
        {
            use std::io::Write;
            let mut f = open_log_file(&path).unwrap();
            writeln!(f, "second").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file.
        let err = open_log_file(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = LogConfig::default()
            .with_file("logs/wabot.log")
            .with_default_directive("wabot=debug")
            .without_console();
        assert_eq!(config.file.as_deref(), Some(Path::new("logs/wabot.log")));
        assert_eq!(config.default_directive, "wabot=debug");
        assert!(!config.console);
        assert!(LogConfig::default().console);
        assert_eq!(LogConfig::default().default_directive, DEFAULT_DIRECTIVE);
    }
}
