//! Logger installation for the command-line front end

use crate::io::error::Result;
use flexi_logger::{Logger, LoggerHandle};

/// Install a stderr logger
///
/// `spec` uses the `RUST_LOG` syntax (e.g. `info` or `photomosaic=debug`); the
/// `RUST_LOG` environment variable takes precedence when set. The returned
/// handle must be kept alive for as long as logging is needed.
///
/// # Errors
///
/// Returns an error if `spec` cannot be parsed or a logger is already installed
pub fn init_logging(spec: &str) -> Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(spec)?
        .format(flexi_logger::default_format)
        .start()?;
    Ok(handle)
}
