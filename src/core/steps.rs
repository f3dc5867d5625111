//! # Step Helpers / 步骤辅助函数
//!
//! Building blocks for step functions that run a command assembled from
//! the test's environment.

use std::time::Instant;
use tracing::debug;

use crate::core::environment::Environment;
use crate::core::error::Result;
use crate::core::models::StepResult;
use crate::infra::command;

/// Expands `template` against `env`, runs it and wraps the outcome.
///
/// A signal termination becomes a failed result; a normal exit is left for
/// checks to judge.
///
/// 根据 `env` 展开 `template` 并执行，将结果包装为 [`StepResult`]。
/// 被信号终止视为失败；正常退出交由检查判断。
pub fn execute(env: &Environment, template: &str, timeout_secs: i64) -> Result<StepResult> {
    let line = env.expand(template)?;
    let testname = env.get_string("testname").unwrap_or_default();
    debug!(test = %testname, command = %line, timeout_secs, "running step command");

    let start = Instant::now();
    let outcome = command::execute_line(&line, None, timeout_secs)?;
    Ok(StepResult::from_process(outcome).with_duration(start.elapsed()))
}
