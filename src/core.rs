//! # Core Module / 核心模块
//!
//! This module contains the execution engine of Sisyphus: the settings
//! environment, the CPU exclusivity lock, steps with their checks and retry
//! policy, tests, discovery and the concurrent suite runner.
//!
//! 此模块包含 Sisyphus 的执行引擎：配置环境、CPU 独占锁、
//! 带检查与重试策略的步骤、测试、测试发现以及并发套件运行器。

pub mod checks;
pub mod config;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod lock;
pub mod models;
pub mod step;
pub mod steps;
pub mod suite;
pub mod test;

// Re-exports
pub use environment::{Environment, Value};
pub use error::Error;
pub use lock::{CpuLock, LockMode};
pub use models::StepResult;
pub use step::Step;
pub use test::{RESULT_OK, Test};
