use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

pub const LOG_FILE_NAME: &str = "failover.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Unknown names fall back to `info`
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// `RUST_LOG` directives when set, the configured level otherwise
fn logger_builder(rust_log: Option<&str>, level: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    match rust_log.map(str::trim).filter(|filters| !filters.is_empty()) {
        Some(filters) => builder.parse_filters(filters),
        None => builder.filter_level(parse_level(level)),
    };
    builder
}

/// Initialize logging to the terminal, mirrored into `<logs_path>/failover.log`
/// unless file logging is disabled
pub fn init_logging(logs_path: Option<PathBuf>, logs_enabled: Option<bool>, log_level: Option<String>) -> Result<()> {
    let save_logs = logs_enabled.unwrap_or(true);
    let level_str = log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let rust_log = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    let mut builder = logger_builder(rust_log.as_deref(), &level_str);

    match logs_path.filter(|_| save_logs) {
        Some(logs_dir) => {
            std::fs::create_dir_all(&logs_dir)
                .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;

            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(logs_dir.join(LOG_FILE_NAME))?;

            builder.target(env_logger::Target::Pipe(Box::new(DualWriter::new(log_file))));
            builder.try_init()?;

            log::info!(
                "Logging initialized. Logs will be written to both terminal and: {} (level: {})",
                logs_dir.join(LOG_FILE_NAME).display(),
                level_str
            );
        }
        None => {
            builder.try_init()?;
            log::info!("Logging initialized. Logs will be written to terminal only (level: {})", level_str);
        }
    }

    Ok(())
}

/// Writes every record to both a file and stdout
struct DualWriter {
    file: std::fs::File,
}

impl DualWriter {
    fn new(file: std::fs::File) -> Self {
        Self { file }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        io::stdout().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        io::stdout().flush()
    }
}
