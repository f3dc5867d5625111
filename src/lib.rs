//! # Sisyphus Library / Sisyphus 库
//!
//! This library provides the core functionality for Sisyphus, a step-based
//! test executor. A test is an ordered list of steps; each step runs under a
//! machine-wide CPU lock, is followed by checks and may be retried. External
//! commands run under resource limits, and limit violations come back as
//! structured signal outcomes.
//!
//! 此库为 Sisyphus 提供核心功能，这是一个基于步骤的测试执行器。
//! 测试是有序的步骤列表；每个步骤在全局 CPU 锁下运行，随后执行检查并可重试。
//! 外部命令在资源限制下运行，超限会以结构化的信号结果返回。
//!
//! ## Modules / 模块
//!
//! - `core` - Environment, lock, steps, tests, discovery and suite runner
//! - `infra` - Command execution, file system helpers and logging
//! - `plugins` - Test factories for C/C++ sources and optitest files
//! - `reporting` - Console and JSON reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 环境、锁、步骤、测试、发现和套件运行器
//! - `infra` - 命令执行、文件系统辅助和日志
//! - `plugins` - C/C++ 源文件和优化测试文件的测试工厂
//! - `reporting` - 控制台和 JSON 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod plugins;
pub mod reporting;

// Re-export commonly used items
pub use core::{CpuLock, Environment, Error, LockMode, RESULT_OK, Step, StepResult, Test};
pub use infra::command::{ProcessOutcome, execute, execute_line};

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
