//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Verbosity used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the logging system
///
/// Verbosity follows `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Calling
/// this more than once is harmless.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_FILTER);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        info!("logger initialized");
    }
}
