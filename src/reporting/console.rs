//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of suite results in the console.
//! It provides functionality for printing colorful, formatted summaries with
//! internationalization support.
//!
//! 此模块处理控制台中套件结果的显示。
//! 它提供打印彩色格式化摘要的功能，支持国际化。

use colored::*;

use crate::core::suite::{TestReport, TestStatus};
use crate::infra::t;

/// Localized label for a status.
/// 状态的本地化标签。
pub fn status_label(status: TestStatus, locale: &str) -> String {
    match status {
        TestStatus::Passed => t!("report.status_passed", locale = locale),
        TestStatus::ExpectedFailure => t!("report.status_expected_failure", locale = locale),
        TestStatus::UnexpectedFailure => t!("report.status_failed", locale = locale),
        TestStatus::UnexpectedPass => t!("report.status_unexpected_pass", locale = locale),
        TestStatus::Skipped => t!("report.status_skipped", locale = locale),
    }
    .to_string()
}

/// Prints a formatted summary of suite results to the console.
/// Displays a table with status, test id, duration and result,
/// using color coding to highlight different statuses.
///
/// 在控制台打印格式化的套件结果摘要。
/// 显示一个包含状态、测试 id、持续时间和结果的表格，
/// 使用颜色编码突出显示不同的状态。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed             | tests/hello.c                            |     1.23s
///   - Failed             | tests/crash.c                            |     0.45s  execute: terminated by signal SIGSEGV
///   - Expected Failure   | tests/todo.c                             |     0.40s  compile: exit code 1
///   - Skipped            | tests/late.c                             |       N/A
/// ```
pub fn print_summary(reports: &[TestReport], locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for report in reports {
        let label = status_label(report.status, locale);
        let label = match report.status {
            TestStatus::Passed => label.green(),
            TestStatus::ExpectedFailure => label.yellow(),
            TestStatus::UnexpectedFailure | TestStatus::UnexpectedPass => label.red(),
            TestStatus::Skipped => label.dimmed(),
        };

        let duration = if report.status == TestStatus::Skipped {
            "N/A".to_string()
        } else {
            format!("{:.2?}", report.duration)
        };

        let detail = if report.result == crate::core::RESULT_OK || report.result.is_empty() {
            String::new()
        } else {
            format!(" {}", report.result)
        };

        println!(
            "  - {:<18} | {:<40} | {:>10}{}",
            label, report.id, duration, detail
        );
    }

    let count = |status: TestStatus| reports.iter().filter(|r| r.status == status).count();
    println!(
        "\n{}",
        t!(
            "report.totals",
            locale = locale,
            total = reports.len(),
            passed = count(TestStatus::Passed),
            expected = count(TestStatus::ExpectedFailure),
            failed = count(TestStatus::UnexpectedFailure) + count(TestStatus::UnexpectedPass),
            skipped = count(TestStatus::Skipped)
        )
    );
}

/// Prints the failing step, expected result and captured output of every
/// test whose result did not match its expectation.
///
/// 打印每个结果与期望不符的测试的失败步骤、期望结果和捕获的输出。
pub fn print_unexpected_failure_details(unexpected: &[&TestReport], locale: &str) {
    if unexpected.is_empty() {
        return;
    }

    println!("\n{}", t!("report.unexpected_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, report) in unexpected.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            unexpected.len(),
            t!("report.header_failure", locale = locale).red(),
            report.id.cyan()
        );
        println!(
            "  {} {}\n  {} {}",
            t!("report.result", locale = locale).yellow(),
            report.result,
            t!("report.expected", locale = locale).yellow(),
            report.expected
        );

        if !report.stdout.trim().is_empty() {
            println!("\n--- {} ---\n", t!("report.stdout_log", locale = locale).yellow());
            println!("{}", report.stdout.trim_end());
        }
        if !report.stderr.trim().is_empty() {
            println!("\n--- {} ---\n", t!("report.stderr_log", locale = locale).yellow());
            println!("{}", report.stderr.trim_end());
        }
        println!("\n{}", "-".repeat(80));
    }
}
