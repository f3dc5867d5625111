//! # Step Module / 步骤模块
//!
//! A step is one named unit of work inside a test: a function over the
//! test's [`Environment`], guarded by the [`CpuLock`], followed by a chain
//! of [`Check`]s and retried under a budget.
//!
//! 步骤是测试中的一个命名工作单元：作用于测试 [`Environment`] 的函数，
//! 受 [`CpuLock`] 保护，随后执行一系列 [`Check`]，并在预算内重试。

use std::fmt;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::core::checks::Check;
use crate::core::environment::Environment;
use crate::core::error::Result;
use crate::core::lock::{CpuLock, LockMode};
use crate::core::models::StepResult;

/// The work a step performs. `Err` means the attempt produced no usable
/// result at all; it is not retried.
pub type StepFn = Box<dyn Fn(&mut Environment) -> Result<StepResult> + Send + Sync>;

/// Runs right before the step function, inside the same lock.
pub type BeforeHook = Box<dyn Fn(&mut Environment) -> Result<()> + Send + Sync>;

pub struct Step {
    name: String,
    func: StepFn,
    checks: Vec<Box<dyn Check>>,
    before: Option<BeforeHook>,
    cpu_exclusive: bool,
    allow_retries: u32,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("checks", &self.checks.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("cpu_exclusive", &self.cpu_exclusive)
            .field("allow_retries", &self.allow_retries)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Creates a shared step with a budget of one attempt.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Environment) -> Result<StepResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
            checks: Vec::new(),
            before: None,
            cpu_exclusive: false,
            allow_retries: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cpu_exclusive(&self) -> bool {
        self.cpu_exclusive
    }

    pub fn allow_retries(&self) -> u32 {
        self.allow_retries
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn cpu_exclusive(&mut self, exclusive: bool) -> &mut Self {
        self.cpu_exclusive = exclusive;
        self
    }

    /// Total number of attempts. Values below one are raised to one.
    pub fn retries(&mut self, attempts: u32) -> &mut Self {
        self.allow_retries = attempts.max(1);
        self
    }

    pub fn add_check(&mut self, check: impl Check + 'static) -> &mut Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn add_checks<I>(&mut self, checks: I) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn Check>>,
    {
        self.checks.extend(checks);
        self
    }

    pub fn set_before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Environment) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    /// Runs the step until it succeeds, its budget runs out, or a failure is
    /// returned early because the test is not expected to pass.
    ///
    /// * `expect_success` - `false` for negative tests: the first failure is
    ///   final and no retries are spent on it.
    ///
    /// Returns the last attempt's result when the budget is exhausted, failed
    /// or not. An `Err` from the hook or the step function is logged and
    /// returned immediately.
    ///
    /// 运行步骤，直到成功、预算耗尽，或因测试不期望成功而提前返回失败。
    pub fn execute(
        &self,
        test_id: &str,
        env: &mut Environment,
        expect_success: bool,
        lock: &CpuLock,
    ) -> Result<StepResult> {
        let mut attempt = 1;
        loop {
            let result = self.attempt(test_id, env, lock)?;

            if result.is_success() || !expect_success || attempt >= self.allow_retries {
                return Ok(result);
            }

            warn!(
                test = test_id,
                step = %self.name,
                attempt,
                budget = self.allow_retries,
                error = result.error().unwrap_or_default(),
                "step failed, retrying"
            );
            attempt += 1;
        }
    }

    /// One attempt: lock, hook, step function, checks. The lock guard lives
    /// until this returns, on every path.
    fn attempt(&self, test_id: &str, env: &mut Environment, lock: &CpuLock) -> Result<StepResult> {
        let _guard = lock.acquire(LockMode::from_exclusive(self.cpu_exclusive));
        let start = Instant::now();

        if let Some(before) = &self.before {
            before(env).inspect_err(|e| {
                error!(test = test_id, step = %self.name, error = %e, "before hook failed");
            })?;
        }

        let mut result = (self.func)(env).inspect_err(|e| {
            error!(test = test_id, step = %self.name, error = %e, "step produced no result");
        })?;
        debug!(test = test_id, step = %self.name, "step finished, now checking");

        if result.is_success() {
            for check in &self.checks {
                check.check(&mut result);
                if result.is_failed() {
                    debug!(
                        test = test_id,
                        step = %self.name,
                        check = check.name(),
                        error = result.error().unwrap_or_default(),
                        "check failed"
                    );
                    break;
                }
            }
        }

        if result.duration().is_zero() {
            result.set_duration(start.elapsed());
        }
        Ok(result)
    }
}
