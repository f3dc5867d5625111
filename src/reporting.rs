//! # Reporting Module / 报告模块
//!
//! This module handles the presentation of suite results: colorful console
//! summaries with internationalization support, and a JSON report for
//! other tools.
//!
//! 此模块处理套件结果的展示：支持国际化的彩色控制台摘要，
//! 以及供其他工具使用的 JSON 报告。

pub mod console;
pub mod json;

// Re-export common reporting functions
pub use console::{print_summary, print_unexpected_failure_details};
pub use json::write_json_report;
