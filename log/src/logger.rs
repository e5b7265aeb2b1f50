//
use crate::{LogError, LogLevel, Logger, set_logger};
use dirs::data_dir;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Console logger with an optional mirror file.
///
/// A pre-existing log file is archived to `<timestamp>.7z` next to it before
/// a fresh one is created.
pub struct AdvancedLogger {
    level: AtomicU8,
    log_file: Option<PathBuf>,
}

impl AdvancedLogger {
    pub fn new(level: LogLevel, log_file: Option<PathBuf>) -> Self {
        let log_file = log_file.and_then(|file| match prepare_log_file(&file) {
            Ok(()) => Some(file),
            Err(e) => {
                eprintln!("Failed to create log file {}: {e}", file.display());
                None
            }
        });

        AdvancedLogger {
            level: AtomicU8::new(level as u8),
            log_file,
        }
    }

    /// Installs a global logger writing to `<data dir>/<app>/latest.log`.
    ///
    /// Without a platform data directory only the console is used.
    pub fn init(app: &str, log_level: LogLevel) -> Result<(), LogError> {
        let log_file = data_dir().map(|dir| dir.join(app).join("latest.log"));
        let logger = Arc::new(AdvancedLogger::new(log_level, log_file));

        set_logger(logger)?;

        Ok(())
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn prepare_log_file(file: &Path) -> std::io::Result<()> {
    if file.exists() {
        archive_previous(file);
    }

    if let Some(parent) = file.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::File::create(file)?;
    Ok(())
}

fn archive_previous(file: &Path) {
    let mut renamed_path = file.to_path_buf();
    renamed_path.set_file_name(format!(
        "{}.log",
        chrono::Local::now().format("%d%m%Y_%H%M%S")
    ));

    if let Err(e) = std::fs::rename(file, &renamed_path) {
        eprintln!("Failed to rename existing log file: {e}");
        return;
    }

    let mut compressed_file = renamed_path.clone();
    compressed_file.set_extension("7z");

    match sevenz_rust2::compress_to_path(&renamed_path, &compressed_file) {
        Ok(()) => {
            std::fs::remove_file(&renamed_path)
                .unwrap_or_else(|e| eprintln!("Failed to remove old log file: {e}"));
        }
        Err(e) => eprintln!("Failed to compress file: {e}"),
    }
}

fn log_to_file(log_file: &Path, message: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file)?;
    writeln!(file, "{message}")?;
    Ok(())
}

impl Logger for AdvancedLogger {
    fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.level().admits(level) {
            return;
        }

        let timestamp = chrono::Local::now().format("%d%m%Y %H:%M:%S");
        println!("{timestamp} - [{level}] - {message}");
        if let Some(ref file) = self.log_file {
            let write_msg = format!("{} - [{}] - {}", timestamp, level.raw_str(), message);
            log_to_file(file, &write_msg).unwrap_or_else(|e| {
                eprintln!("Failed to write to log file: {e}");
            });
        }
    }
}
