//! File backed diagnostic log
//!
//! The plugin must never write diagnostics to stdout since the runtime
//! parses it, so every record goes to a local file as one json object per
//! line. The logger is built once in main and handed to the handlers.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{Level, Log, Record};

use crate::error::{ChainedError, ChainedResult};

// Log file used when nothing else is configured, relative to the working
// directory of the runtime.
pub const DEFAULT_LOG_FILE: &str = "chained-cni.log";
pub const LOG_FILE_ENV: &str = "CHAINED_CNI_LOG_FILE";

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_LEVEL_ENV: &str = "CHAINED_CNI_LOG_LEVEL";

// Exit code used when the log file cannot be set up.
pub const LOG_INIT_EXIT_CODE: i32 = 2;

const LOG_TARGET: &str = "chained_cni";

/// Cloneable handle to the diagnostic log.
#[derive(Clone)]
pub struct PluginLogger {
    inner: Arc<dyn Log>,
}

impl PluginLogger {
    pub fn new(inner: Arc<dyn Log>) -> Self {
        PluginLogger { inner }
    }

    /// Open (or create) the log file in append mode and build a json
    /// logger on top of it. `filter` uses the env_logger filter syntax.
    pub fn init(path: &Path, filter: &str) -> ChainedResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ChainedError::wrap(
                    format!("failed to open log file {}", path.display()),
                    e.into(),
                )
            })?;

        let logger = env_logger::Builder::new()
            .parse_filters(filter)
            .target(env_logger::Target::Pipe(Box::new(file)))
            .write_style(env_logger::WriteStyle::Never)
            .format(|buf, record| {
                let line = serde_json::json!({
                    "level": record.level().as_str().to_lowercase(),
                    "ts": buf.timestamp_millis().to_string(),
                    "logger": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{}", line)
            })
            .build();

        Ok(PluginLogger::new(Arc::new(logger)))
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .level(level)
            .target(LOG_TARGET)
            .args(args)
            .build();
        if self.inner.enabled(record.metadata()) {
            self.inner.log(&record);
        }
    }

    pub fn flush(&self) {
        self.inner.flush();
    }
}

impl fmt::Debug for PluginLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLogger").finish_non_exhaustive()
    }
}

/// Log settings, read from the environment with a command line override.
#[derive(clap::Args, Clone, Debug)]
pub struct LogOpts {
    /// Path of the diagnostic log file.
    #[clap(long, env = LOG_FILE_ENV, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
    /// Log filter, e.g. "info" or "debug".
    #[clap(long, env = LOG_LEVEL_ENV, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl LogOpts {
    pub fn init(&self) -> ChainedResult<PluginLogger> {
        PluginLogger::init(&self.log_file, &self.log_level)
    }
}

/// Helper to render values as json inside log messages.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<failed to serialize: {}>", e))
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_init_writes_json_lines() {
        let tmpdir = Builder::new().prefix("chained-cni-tests").tempdir().unwrap();
        let path = tmpdir.path().join("plugin.log");

        let logger = PluginLogger::init(&path, "info").unwrap();
        logger.info(format_args!("hello {}", "world"));
        logger.debug(format_args!("filtered out"));
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1, "log content: {}", content);

        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["level"], "info");
        assert_eq!(record["msg"], "hello world");
        assert_eq!(record["logger"], "chained_cni");
    }

    #[test]
    fn test_init_appends() {
        let tmpdir = Builder::new().prefix("chained-cni-tests").tempdir().unwrap();
        let path = tmpdir.path().join("plugin.log");

        for i in 0..2 {
            let logger = PluginLogger::init(&path, "debug").unwrap();
            logger.debug(format_args!("run {}", i));
            logger.flush();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_init_missing_dir() {
        let tmpdir = Builder::new().prefix("chained-cni-tests").tempdir().unwrap();
        let path = tmpdir.path().join("missing").join("plugin.log");
        assert!(PluginLogger::init(&path, "info").is_err());
    }
}
