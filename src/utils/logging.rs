use std::{env, fs, path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

pub const CLI_PREFIX: &str = "tt";

const KEPT_LOG_FILES: usize = 5;

/// Filter for events of this crate. `--debug` wins over `RUST_LOG`, `info` is the fallback.
fn crate_filter(debug: bool, rust_log: Option<String>) -> String {
    let level = if debug {
        LevelFilter::DEBUG.to_string()
    } else {
        rust_log
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| LevelFilter::INFO.to_string())
    };
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// The appender prunes old files on creation, so `log_dir` has to exist before it is built.
fn log_appender(prefix: &str, log_dir: &Path) -> Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)?;
    Ok(tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(prefix)
        .build(log_dir)?)
}

/// Logs go to a daily rotated file inside `log_dir`. With `debug` they are mirrored to stderr,
/// stdout stays reserved for command output.
pub fn enable_logging(prefix: &str, log_dir: &Path, debug: bool) -> Result<()> {
    let appender = log_appender(prefix, log_dir)?;

    let stderr = std::io::stderr.with_filter(move |_| debug);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(crate_filter(
            debug,
            env::var("RUST_LOG").ok(),
        )))
        .with_ansi(false)
        .with_writer(stderr.and(appender))
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
