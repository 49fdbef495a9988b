use std::path::Path;

use flexi_logger::{
    colored_default_format, opt_format, Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger,
    LoggerHandle, Naming,
};

/// Start the global logger.
///
/// The level comes from `RUST_LOG`, falling back to `info`. With a log
/// directory the output goes to rotating files there, otherwise to stderr.
/// The returned handle must stay alive for the lifetime of the process.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str("info")?;

    match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("storefront"))
            .format(opt_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            )
            .start(),
        None => logger.format(colored_default_format).start(),
    }
}
