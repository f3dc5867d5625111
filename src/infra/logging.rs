//! # Logging Module / 日志模块
//!
//! Installs the `tracing` subscriber used by the command-line tool. The
//! library itself only emits events.
//!
//! 为命令行工具安装 `tracing` 订阅器。库本身只负责产生事件。

use tracing_subscriber::EnvFilter;

/// Maps `-v` counts to a default filter; `RUST_LOG` takes precedence.
pub fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr formatter. Calling it twice is harmless: the second
/// subscriber is ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
