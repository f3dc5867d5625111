//! # Test Module / 测试模块
//!
//! A test is an ordered list of steps sharing one environment. Running it
//! executes the steps in sequence and stops at the first step that ends in
//! failure; afterwards the test is a read-only report.
//!
//! 测试是共享同一环境的有序步骤列表。运行时按顺序执行步骤，
//! 在第一个失败的步骤处停止；之后测试成为只读报告。

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::environment::Environment;
use crate::core::error::{Error, Result};
use crate::core::lock::CpuLock;
use crate::core::models::StepResult;
use crate::core::step::Step;

/// Result string of a test whose steps all succeeded.
pub const RESULT_OK: &str = "ok";

#[derive(Debug)]
pub struct Test {
    id: String,
    environment: Environment,
    steps: Vec<Step>,
    step_results: HashMap<String, StepResult>,
    success: bool,
    result: String,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    duration: Duration,
}

impl Test {
    /// Creates an empty test whose environment holds `testname = id`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let environment = Environment::from_iter([("testname", id.as_str())]);
        Self::with_environment(id, environment)
    }

    /// Creates a test on top of suite-wide defaults. The defaults' override
    /// protection carries over, so a default named `testname` is an error
    /// when protection is on.
    pub fn with_defaults(id: impl Into<String>, defaults: &Environment) -> Result<Self> {
        let id = id.into();
        let mut environment = defaults.clone();
        environment.set("testname", id.as_str())?;
        Ok(Self::with_environment(id, environment))
    }

    fn with_environment(id: String, environment: Environment) -> Self {
        Self {
            id,
            environment,
            steps: Vec::new(),
            step_results: HashMap::new(),
            success: true,
            result: RESULT_OK.to_string(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Appends a step. Names must be unique within the test.
    pub fn add_step<F>(&mut self, name: impl Into<String>, func: F) -> Result<&mut Step>
    where
        F: Fn(&mut Environment) -> Result<StepResult> + Send + Sync + 'static,
    {
        let step = self.new_step(name.into(), func)?;
        let index = self.steps.len();
        self.steps.push(step);
        Ok(&mut self.steps[index])
    }

    /// Inserts a step before all others.
    pub fn prepend_step<F>(&mut self, name: impl Into<String>, func: F) -> Result<&mut Step>
    where
        F: Fn(&mut Environment) -> Result<StepResult> + Send + Sync + 'static,
    {
        let step = self.new_step(name.into(), func)?;
        self.steps.insert(0, step);
        Ok(&mut self.steps[0])
    }

    fn new_step<F>(&self, name: String, func: F) -> Result<Step>
    where
        F: Fn(&mut Environment) -> Result<StepResult> + Send + Sync + 'static,
    {
        if self.steps.iter().any(|s| s.name() == name) {
            return Err(Error::DuplicateStep { name });
        }
        Ok(Step::new(name, func))
    }

    /// Runs every step in order.
    ///
    /// * `expect_result` - the result string this test is expected to end
    ///   with. Anything other than [`RESULT_OK`] marks a negative test, whose
    ///   steps return their first failure without retrying.
    ///
    /// The first failing step stops the run: `result` becomes
    /// `"<step>: <error>"` and its output becomes the test's output.
    ///
    /// 按顺序运行所有步骤。第一个失败的步骤会终止运行：`result` 变为
    /// `"<step>: <error>"`，该步骤的输出成为测试的输出。
    pub fn run(&mut self, expect_result: &str, lock: &CpuLock) {
        self.stdout.clear();
        self.stderr.clear();
        self.success = true;
        self.result = RESULT_OK.to_string();
        self.step_results.clear();
        let expect_success = expect_result == RESULT_OK;
        let start = Instant::now();

        for step in &self.steps {
            match step.execute(&self.id, &mut self.environment, expect_success, lock) {
                Ok(step_result) => {
                    let failure = step_result.error().map(|e| {
                        (
                            format!("{}: {e}", step.name()),
                            step_result.stdout().to_vec(),
                            step_result.stderr().to_vec(),
                        )
                    });
                    self.step_results.insert(step.name().to_string(), step_result);
                    if let Some((result, stdout, stderr)) = failure {
                        self.success = false;
                        self.result = result;
                        self.stdout = stdout;
                        self.stderr = stderr;
                        break;
                    }
                }
                Err(e) => {
                    self.success = false;
                    self.result = format!("{}: {e}", step.name());
                    break;
                }
            }
        }

        self.duration = start.elapsed();
        debug!(test = %self.id, result = %self.result, "all steps finished");
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_results(&self) -> &HashMap<String, StepResult> {
        &self.step_results
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
