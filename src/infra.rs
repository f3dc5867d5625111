//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Sisyphus,
//! including resource-limited command execution, file system helpers,
//! logging setup and i18n support.
//!
//! 此模块为 Sisyphus 提供基础设施服务，
//! 包括受资源限制的命令执行、文件系统辅助、日志设置和国际化支持。

pub mod command;
pub mod fs;
pub mod logging;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
