//! # Suite Runner Module / 测试套件运行模块
//!
//! Runs many tests concurrently, each on its own blocking thread, all of
//! them sharing one [`CpuLock`]. Results are compared against expectations
//! so known failures don't break the run.
//!
//! 并发运行多个测试，每个测试在独立的阻塞线程上执行，共享同一个 [`CpuLock`]。
//! 结果与期望进行比较，已知的失败不会导致整体运行失败。

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::lock::CpuLock;
use crate::core::test::{RESULT_OK, Test};

/// Expected result string per test id. Tests not listed are expected to pass.
///
/// 每个测试 id 对应的期望结果字符串。未列出的测试期望通过。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expectations(HashMap<String, String>);

impl Expectations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, expected: impl Into<String>) {
        self.0.insert(id.into(), expected.into());
    }

    pub fn expected(&self, id: &str) -> &str {
        self.0.get(id).map(String::as_str).unwrap_or(RESULT_OK)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Expectations {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How a test's result relates to what was expected of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Passed, as expected.
    Passed,
    /// Failed exactly the way it was expected to.
    ExpectedFailure,
    /// Failed although something else was expected.
    UnexpectedFailure,
    /// Passed although a failure was expected.
    UnexpectedPass,
    /// Never ran because the run was stopped.
    Skipped,
}

impl TestStatus {
    pub fn classify(result: &str, expected: &str) -> Self {
        match (result == expected, result == RESULT_OK) {
            (true, true) => TestStatus::Passed,
            (true, false) => TestStatus::ExpectedFailure,
            (false, true) => TestStatus::UnexpectedPass,
            (false, false) => TestStatus::UnexpectedFailure,
        }
    }

    /// Whether this status should make the whole run fail.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, TestStatus::UnexpectedFailure | TestStatus::UnexpectedPass)
    }
}

/// Summary of one step of a finished test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub error: Option<String>,
    pub retcode: Option<i32>,
    pub duration: Duration,
}

/// Serializable report of a finished (or skipped) test.
///
/// 已完成（或被跳过）测试的可序列化报告。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub id: String,
    pub status: TestStatus,
    pub expected: String,
    pub result: String,
    pub stdout: String,
    pub stderr: String,
    pub steps: Vec<StepReport>,
    pub duration: Duration,
}

impl TestReport {
    pub fn from_test(test: &Test, expected: &str) -> Self {
        // Executed steps, in the order they were declared.
        let steps = test
            .steps()
            .iter()
            .filter_map(|step| {
                test.step_results().get(step.name()).map(|r| StepReport {
                    name: step.name().to_string(),
                    error: r.error().map(str::to_string),
                    retcode: r.retcode(),
                    duration: r.duration(),
                })
            })
            .collect();

        Self {
            id: test.id().to_string(),
            status: TestStatus::classify(test.result(), expected),
            expected: expected.to_string(),
            result: test.result().to_string(),
            stdout: String::from_utf8_lossy(test.stdout()).into_owned(),
            stderr: String::from_utf8_lossy(test.stderr()).into_owned(),
            steps,
            duration: test.duration(),
        }
    }

    pub fn skipped(id: impl Into<String>, expected: &str) -> Self {
        Self {
            id: id.into(),
            status: TestStatus::Skipped,
            expected: expected.to_string(),
            result: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            steps: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Runs `tests` with at most `jobs` of them in flight.
///
/// Each test runs on a blocking thread; only the [`CpuLock`] is shared.
/// Once `stop` is cancelled no further tests are started and the remaining
/// ones are reported as [`TestStatus::Skipped`]. Tests already running finish.
///
/// Reports come back sorted by test id.
///
/// 以最多 `jobs` 个并发运行 `tests`。`stop` 被取消后不再启动新测试，
/// 剩余测试报告为跳过；已在运行的测试会完成。
pub async fn run_tests(
    tests: Vec<Test>,
    jobs: usize,
    expectations: &Expectations,
    lock: Arc<CpuLock>,
    stop: CancellationToken,
) -> Vec<TestReport> {
    let jobs = jobs.max(1);
    info!(count = tests.len(), jobs, "running tests");

    let pending = tests.into_iter().map(|mut test| {
        let expected = expectations.expected(test.id()).to_string();
        let lock = Arc::clone(&lock);
        let stop = stop.clone();

        async move {
            let id = test.id().to_string();
            if stop.is_cancelled() {
                return TestReport::skipped(id, &expected);
            }

            let thread_expected = expected.clone();
            let handle = tokio::task::spawn_blocking(move || {
                test.run(&thread_expected, &lock);
                TestReport::from_test(&test, &thread_expected)
            });

            match handle.await {
                Ok(report) => {
                    info!(test = %report.id, result = %report.result, status = ?report.status, "test finished");
                    report
                }
                Err(e) => {
                    // A panicking step function takes its test down with it.
                    warn!(test = %id, error = %e, "test thread failed");
                    let result = format!("internal error: {e}");
                    TestReport {
                        status: TestStatus::classify(&result, &expected),
                        result,
                        ..TestReport::skipped(id, &expected)
                    }
                }
            }
        }
    });

    let mut reports: Vec<TestReport> = stream::iter(pending).buffer_unordered(jobs).collect().await;
    reports.sort_by(|a, b| a.id.cmp(&b.id));
    reports
}
