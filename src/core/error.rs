//! # Error Module / 错误模块
//!
//! Errors raised by the execution engine. Everything here is resolved at the
//! step level: `Test::run` folds them into its result string and never lets
//! them escape.
//!
//! 执行引擎产生的错误。所有错误都在步骤层面处理：
//! `Test::run` 将其折叠进结果字符串，不会向外传播。

use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A setting was read before anything stored it.
    /// 读取了尚未设置的配置项。
    #[error("no such setting '{key}'")]
    NoSuchSetting { key: String },

    /// A protected environment refused to replace an existing setting.
    /// 受保护的环境拒绝覆盖已有配置项。
    #[error("overriding disabled for environment (setting '{key}')")]
    OverrideDisabled { key: String },

    /// A setting exists but holds a value of another type.
    #[error("setting '{key}' is not {expected}")]
    SettingType { key: String, expected: &'static str },

    #[error("step '{name}' already exists in test")]
    DuplicateStep { name: String },

    /// The step function produced no result at all.
    /// 步骤函数没有产生任何结果。
    #[error("step produced no result")]
    NoResult,

    #[error("empty command line")]
    EmptyCommand,

    #[error("cannot split command line: {line}")]
    CommandParse { line: String },

    /// The child process could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
