//! # Data Models Module / 数据模型模块
//!
//! The outcome of a single step attempt.
//!
//! 单次步骤尝试的结果。

use std::time::Duration;

use crate::infra::command::ProcessOutcome;

/// Result of one attempt of a step function, possibly demoted by checks.
///
/// A result starts out successful or failed and can only move from success
/// to failure: there is no way to clear a recorded error. The first recorded
/// reason is kept.
///
/// 步骤函数单次尝试的结果，可能被检查降级为失败。
/// 结果只能从成功变为失败，无法清除已记录的错误；保留第一个失败原因。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepResult {
    error: Option<String>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    retcode: Option<i32>,
    duration: Duration,
}

impl StepResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Converts a process outcome into a result.
    ///
    /// A normal exit is a success carrying its exit code, leaving the verdict
    /// on that code to checks. A signal termination is a failure.
    pub fn from_process(outcome: ProcessOutcome) -> Self {
        match outcome {
            ProcessOutcome::Exited {
                code,
                stdout,
                stderr,
            } => Self {
                error: None,
                stdout,
                stderr,
                retcode: Some(code),
                duration: Duration::ZERO,
            },
            ProcessOutcome::Signaled {
                signal,
                name,
                stdout,
                stderr,
            } => Self {
                error: Some(format!("terminated by signal {name}")),
                stdout,
                stderr,
                retcode: Some(-signal),
                duration: Duration::ZERO,
            },
        }
    }

    pub fn with_output(mut self, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn with_retcode(mut self, retcode: i32) -> Self {
        self.retcode = Some(retcode);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Marks the result as failed. A reason recorded earlier wins.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn retcode(&self) -> Option<i32> {
        self.retcode
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }
}
