//! # Commands Module / 命令模块
//!
//! Implementations of the CLI subcommands.
//!
//! CLI 子命令的实现。

pub mod run;
