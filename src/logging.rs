use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Logger that writes to a rotating file and echoes serious messages to stderr
struct ServerLogger {
    file_writer: Arc<Mutex<RollingFileAppender>>,
    file_level: LevelFilter,
    stderr_level: LevelFilter,
}

impl Log for ServerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() <= self.stderr_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();

        if level <= self.file_level
            && let Ok(mut writer) = self.file_writer.lock()
        {
            let _ = writeln!(
                writer,
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                level,
                record.target(),
                record.args()
            );
        }

        if level <= self.stderr_level {
            eprintln!("{}: {}", level.as_str().to_lowercase(), record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.file_writer.lock() {
            let _ = writer.flush();
        }
    }
}

/// Parse log level string to LevelFilter
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info, // Default to info
    }
}

/// Initialize the file logger
/// Warnings and errors are also printed to stderr
pub fn init_logger(log_file_path: &Path, file_level: &str) -> Result<()> {
    let log_dir = log_file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path {:?}", log_file_path))?;
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Daily rotation, keep 3 files
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("server"),
        )
        .filename_suffix(
            log_file_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(log_dir)
        .context("Failed to create rotating file appender")?;

    let file_level = parse_level(file_level);
    let stderr_level = LevelFilter::Warn;

    let logger = ServerLogger {
        file_writer: Arc::new(Mutex::new(file_appender)),
        file_level,
        stderr_level,
    };

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(file_level.max(stderr_level));

    Ok(())
}

/// Initialize stderr-only logging, `RUST_LOG` overrides the default `warn`
pub fn init_stderr_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }
}
