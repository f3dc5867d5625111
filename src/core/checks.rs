//! # Checks Module / 检查模块
//!
//! Checks inspect a successful step result and may demote it to a failure.
//! Any `Fn(&mut StepResult)` closure is a check; the stock ones cover exit
//! codes and comparison against a reference output file.
//!
//! 检查会审视成功的步骤结果，并可能将其降级为失败。
//! 任何 `Fn(&mut StepResult)` 闭包都是检查；内置检查涵盖退出码和参考输出比较。

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::StepResult;

/// A predicate run over a step result after the step function succeeded.
///
/// Implementations call [`StepResult::fail`] to reject a result. They cannot
/// turn a failed result back into a success.
pub trait Check: Send + Sync {
    fn check(&self, result: &mut StepResult);

    fn name(&self) -> &str {
        "check"
    }
}

impl<F> Check for F
where
    F: Fn(&mut StepResult) + Send + Sync,
{
    fn check(&self, result: &mut StepResult) {
        self(result)
    }
}

/// Fails a result whose exit code is not zero.
/// 退出码非零时判定失败。
#[derive(Debug, Clone, Copy, Default)]
pub struct RetcodeZero;

impl Check for RetcodeZero {
    fn check(&self, result: &mut StepResult) {
        match result.retcode() {
            Some(0) => {}
            Some(code) => result.fail(format!("exit code {code}")),
            None => result.fail("no exit code recorded"),
        }
    }

    fn name(&self) -> &str {
        "retcode_zero"
    }
}

/// Compares captured stdout byte-for-byte with a reference file.
/// 将捕获的标准输出与参考文件逐字节比较。
#[derive(Debug, Clone)]
pub struct ReferenceOutput {
    path: PathBuf,
}

impl ReferenceOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Check for ReferenceOutput {
    fn check(&self, result: &mut StepResult) {
        match fs::read(&self.path) {
            Ok(expected) => {
                if expected != result.stdout() {
                    result.fail(format!(
                        "output differs from reference {}",
                        self.path.display()
                    ));
                }
            }
            Err(e) => result.fail(format!(
                "reference output {} unreadable: {e}",
                self.path.display()
            )),
        }
    }

    fn name(&self) -> &str {
        "reference_output"
    }
}
