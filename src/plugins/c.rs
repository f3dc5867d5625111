//! # C / C++ Plugin / C 与 C++ 插件
//!
//! Tests made of a single C or C++ source file: compile it, run the
//! executable, compare its output with `<source>.ref` when that file exists.
//!
//! 由单个 C 或 C++ 源文件组成的测试：编译、运行可执行文件，
//! 若存在 `<source>.ref` 则与其比较输出。

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::checks::{ReferenceOutput, RetcodeZero};
use crate::core::discovery::TestFactory;
use crate::core::environment::Environment;
use crate::core::error::{self, Error};
use crate::core::models::StepResult;
use crate::core::steps;
use crate::core::test::Test;
use crate::infra::fs::ensure_parent_dir;
use crate::plugins::reference_path;

/// CPU seconds granted to the compiler.
pub const COMPILE_TIMEOUT: i64 = 60;

/// Default settings the C and C++ steps rely on.
pub fn defaults() -> Environment {
    Environment::from_iter([
        ("cc", "gcc"),
        ("cxx", "g++"),
        ("cppflags", ""),
        ("arch_cppflags", ""),
        ("cflags", ""),
        ("arch_cflags", ""),
        ("cxxflags", ""),
        ("arch_cxxflags", ""),
        ("ldflags", ""),
        ("arch_ldflags", ""),
        ("builddir", "build"),
    ])
}

/// Combines each flag setting with its `arch_` counterpart into
/// `full_cppflags`, `full_cflags`, `full_cxxflags` and `full_ldflags`.
pub fn setup_c_environment(env: &mut Environment) -> error::Result<()> {
    for flag in ["cppflags", "cflags", "cxxflags", "ldflags"] {
        let arch = env.get_string(&format!("arch_{flag}"))?;
        let own = env.get_string(flag)?;
        let combined = format!("{arch} {own}").trim().to_string();
        env.set_if_absent(format!("full_{flag}"), combined);
    }
    Ok(())
}

/// Records `executable = ${builddir}/${testname}.exe` and creates its directory.
fn prepare_executable(env: &mut Environment) -> error::Result<()> {
    let executable = env.expand("${builddir}/${testname}.exe")?;
    env.set_if_absent("executable", executable);
    ensure_parent_dir(Path::new(env.get_str("executable")?))?;
    Ok(())
}

/// Compiles C source code to an executable.
/// 将 C 源代码编译为可执行文件。
pub fn step_compile_c(env: &mut Environment) -> error::Result<StepResult> {
    setup_c_environment(env)?;
    prepare_executable(env)?;
    let source = env.get_string("testname")?;
    env.set_if_absent("cfile", source);
    steps::execute(
        env,
        "${cc} ${full_cppflags} ${full_cflags} ${full_ldflags} -o ${executable} ${cfile}",
        COMPILE_TIMEOUT,
    )
}

/// Compiles C++ source code to an executable.
/// 将 C++ 源代码编译为可执行文件。
pub fn step_compile_cxx(env: &mut Environment) -> error::Result<StepResult> {
    setup_c_environment(env)?;
    prepare_executable(env)?;
    let source = env.get_string("testname")?;
    env.set_if_absent("cxxfile", source);
    steps::execute(
        env,
        "${cxx} ${full_cppflags} ${full_cxxflags} ${full_ldflags} -o ${executable} ${cxxfile}",
        COMPILE_TIMEOUT,
    )
}

/// Runs the executable built by a compile step, limited to `run_timeout`
/// CPU seconds. Fractional timeouts are rounded up to whole seconds.
pub fn step_run_executable(env: &mut Environment) -> error::Result<StepResult> {
    let timeout = env.get_float("run_timeout")?.ceil() as i64;
    steps::execute(env, "${executable}", timeout)
}

type CompileFn = fn(&mut Environment) -> error::Result<StepResult>;

/// Reads an optional setting: unset is `None`, a value of the wrong type is
/// still an error.
fn optional<T>(value: error::Result<T>) -> error::Result<Option<T>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(Error::NoSuchSetting { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn build_test(path: &Path, defaults: &Environment, compile: CompileFn) -> Result<Test> {
    let mut test = Test::with_defaults(path.display().to_string(), defaults)?;
    let env = test.environment();
    let exclusive = optional(env.get_bool("cpu_exclusive"))?.unwrap_or(false);
    let attempts = match optional(env.get_int("run_retries"))? {
        Some(n) => u32::try_from(n)
            .with_context(|| format!("setting 'run_retries' must not be negative, got {n}"))?,
        None => 1,
    };

    test.add_step("compile", compile)?.add_check(RetcodeZero);

    let reference = reference_path(path);
    let run = test.add_step("execute", step_run_executable)?;
    run.cpu_exclusive(exclusive)
        .retries(attempts)
        .add_check(RetcodeZero);
    if reference.is_file() {
        run.add_check(ReferenceOutput::new(reference));
    }
    Ok(test)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e))
}

/// Factory for `*.c` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFactory;

impl TestFactory for CFactory {
    fn name(&self) -> &str {
        "c"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["c"])
    }

    fn create(&self, path: &Path, defaults: &Environment) -> Result<Test> {
        build_test(path, defaults, step_compile_c)
    }
}

/// Factory for `*.cc`, `*.cpp` and `*.cxx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CxxFactory;

impl TestFactory for CxxFactory {
    fn name(&self) -> &str {
        "cxx"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["cc", "cpp", "cxx"])
    }

    fn create(&self, path: &Path, defaults: &Environment) -> Result<Test> {
        build_test(path, defaults, step_compile_cxx)
    }
}
