//! Logging system shared by the swift binaries.

use clap::Args;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Command-line logging arguments, mirroring the verbosity/quiet/json shape
/// used throughout the swift binaries.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct LogArgs {
    /// Silence all logging output.
    #[arg(long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Increase verbosity. Can be passed multiple times (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Explicit `tracing_subscriber::EnvFilter` directive, overrides
    /// `-v`/`--quiet` and `RUST_LOG` when set.
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory to additionally write rotating log files to.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Maximum size, in megabytes, of a single log file before rotation.
    #[arg(long, global = true, default_value_t = 100)]
    pub max_file_size_mb: u64,

    /// Number of rotated log files to retain.
    #[arg(long, global = true, default_value_t = 5)]
    pub max_files: usize,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self {
            quiet: false,
            verbosity: 0,
            filter: None,
            json: false,
            log_dir: None,
            max_file_size_mb: 100,
            max_files: 5,
        }
    }
}

impl LogArgs {
    fn directive(&self) -> String {
        if self.quiet {
            return "off".to_string();
        }
        let level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("{level},swift=trace")
    }
}

/// Initialize the global `tracing` subscriber from [`LogArgs`].
///
/// `RUST_LOG` and `--filter` both take precedence over `-v`/`--quiet`.
pub fn init_logging(args: &LogArgs) -> eyre::Result<()> {
    let registry = tracing_subscriber::registry();

    let env_filter = if let Some(filter) = &args.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.directive()))
    };

    let stdout_layer = fmt::Layer::new()
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true);
    let stdout_layer = if args.json {
        stdout_layer.json().boxed()
    } else {
        stdout_layer.boxed()
    };

    let registry = registry.with(stdout_layer);

    let registry = if let Some(log_dir) = &args.log_dir {
        let log_file = setup_log_file(log_dir, args.max_file_size_mb, args.max_files)?;
        let file_layer = fmt::Layer::new()
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .with_writer(Arc::new(log_file));
        let file_layer = if args.json {
            file_layer.json().boxed()
        } else {
            file_layer.boxed()
        };
        registry.with(file_layer)
    } else {
        registry
    };

    registry.with(env_filter).try_init()?;

    Ok(())
}

fn setup_log_file(dir: impl AsRef<Path>, max_size_mb: u64, max_files: usize) -> eyre::Result<RotatingFile> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).context("failed to create log directory")?;

    let log_path = dir.join("swift.log");
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("failed to open log file")?;

    Ok(RotatingFile {
        file,
        path: log_path,
        max_size: max_size_mb * 1024 * 1024,
        max_files,
        current_size: 0,
    })
}

/// A writer that rotates the underlying file once it exceeds `max_size`.
pub struct RotatingFile {
    file: File,
    path: PathBuf,
    max_size: u64,
    max_files: usize,
    current_size: u64,
}

impl RotatingFile {
    fn maybe_rotate(&mut self) -> io::Result<()> {
        let metadata = self.file.metadata()?;
        self.current_size = metadata.len();
        if self.current_size >= self.max_size {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        for i in (1..self.max_files).rev() {
            let src = self.path.with_extension(format!("{}.log", i - 1));
            let dst = self.path.with_extension(format!("{}.log", i));
            if src.exists() {
                std::fs::rename(&src, &dst)?;
            }
        }

        let backup = self.path.with_extension("0.log");
        std::fs::rename(&self.path, &backup)?;

        self.file = File::options().create(true).append(true).open(&self.path)?;
        self.current_size = 0;

        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.maybe_rotate()?;
        let bytes_written = self.file.write(buf)?;
        self.current_size += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbosity() {
        let args = LogArgs {
            quiet: true,
            verbosity: 3,
            ..Default::default()
        };
        assert_eq!(args.directive(), "off");
    }

    #[test]
    fn verbosity_escalates() {
        let mut args = LogArgs::default();
        assert_eq!(args.directive(), "info,swift=trace");
        args.verbosity = 1;
        assert_eq!(args.directive(), "debug,swift=trace");
        args.verbosity = 5;
        assert_eq!(args.directive(), "trace,swift=trace");
    }
}
