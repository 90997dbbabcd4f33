//! Logger installation for each platform.

use crate::config::LogLevel;

/// Install the global logger: the browser console on WASM, stderr natively.
///
/// Fails if a logger is already installed.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LogLevel) -> Result<(), log::SetLoggerError> {
    console_log::init_with_level(level.to_level())
}

/// Install the global logger: the browser console on WASM, stderr natively.
///
/// Fails if a logger is already installed. `RUST_LOG` overrides `level`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LogLevel) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_env("RUST_LOG")
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init(LogLevel::Debug);
        assert!(init(LogLevel::Info).is_err());
        log::debug!("logger installed");
    }
}
