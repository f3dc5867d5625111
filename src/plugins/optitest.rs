//! # Optitest Plugin / 优化测试插件
//!
//! Each file in an optitest directory is handed to an external
//! optimization-test script; the script must exit with 0 and print exactly
//! the contents of `<file>.ref`.
//!
//! 优化测试目录中的每个文件都交给外部优化测试脚本处理；脚本必须以 0 退出，
//! 且输出与 `<file>.ref` 完全一致。

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::checks::{ReferenceOutput, RetcodeZero};
use crate::core::discovery::TestFactory;
use crate::core::environment::Environment;
use crate::core::error;
use crate::core::models::StepResult;
use crate::core::steps;
use crate::core::test::Test;
use crate::infra::fs::ensure_dir;
use crate::plugins::reference_path;

/// CPU seconds granted to one script run.
pub const OPTITEST_TIMEOUT: i64 = 20;

pub fn defaults() -> Environment {
    Environment::from_iter([("optitest_script", "./test_optimization.py")])
}

pub fn step_optitest(env: &mut Environment) -> error::Result<StepResult> {
    steps::execute(env, "${optitest_script} ${filename}", OPTITEST_TIMEOUT)
}

/// Claims every regular file except reference outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptitestFactory;

impl TestFactory for OptitestFactory {
    fn name(&self) -> &str {
        "optitest"
    }

    fn matches(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_none_or(|e| e != "ref")
    }

    fn create(&self, path: &Path, defaults: &Environment) -> Result<Test> {
        let builddir = defaults
            .get_string("builddir")
            .unwrap_or_else(|_| "build".to_string());
        let output_dir = Path::new(&builddir).join("optitest");
        ensure_dir(&output_dir)
            .with_context(|| format!("Couldn't create {}", output_dir.display()))?;

        let filename = path.display().to_string();
        let mut test = Test::with_defaults(filename.as_str(), defaults)?;
        test.environment_mut().set("filename", filename)?;
        test.add_step("optitest", step_optitest)?
            .add_check(RetcodeZero)
            .add_check(ReferenceOutput::new(reference_path(path)));
        Ok(test)
    }
}
