mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use sisyphus::core::discovery::{self, TestFactory};
use sisyphus::core::environment::{Environment, Value};
use sisyphus::core::models::StepResult;
use sisyphus::core::test::Test;
use sisyphus::core::lock::CpuLock;
use sisyphus::core::suite::{Expectations, TestStatus, run_tests};
use sisyphus::plugins::{self, c::CFactory, c::CxxFactory, optitest::OptitestFactory};
use tempfile::{TempDir, tempdir};
use tokio_util::sync::CancellationToken;

use common::{write_file, write_script};

/// A stand-in compiler: writes a shell script printing `hello` to the `-o`
/// target, so the C pipeline runs without a real toolchain.
const FAKE_CC: &str = r#"
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
printf '#!/bin/sh\necho hello\n' > "$out"
chmod +x "$out"
"#;

fn defaults_in(tools: &Path, build: &Path) -> Environment {
    let mut env = plugins::default_environment();
    env.set("builddir", build.display().to_string()).unwrap();
    env.set(
        "optitest_script",
        write_script(tools, "optitest.sh", "cat \"$1\"").display().to_string(),
    )
    .unwrap();
    env.set(
        "cc",
        write_script(tools, "fake-cc.sh", FAKE_CC).display().to_string(),
    )
    .unwrap();
    env
}

struct Fixture {
    _root: TempDir,
    tests: std::path::PathBuf,
    defaults: Environment,
}

fn fixture() -> Fixture {
    let root = tempdir().unwrap();
    let tools = root.path().join("tools");
    let tests = root.path().join("tests");
    fs::create_dir_all(&tools).unwrap();
    fs::create_dir_all(&tests).unwrap();
    let defaults = defaults_in(&tools, &root.path().join("build"));
    Fixture {
        _root: root,
        tests,
        defaults,
    }
}

fn id(path: &Path) -> String {
    path.display().to_string()
}

#[tokio::test]
async fn test_optitest_suite_with_expectations() {
    let fx = fixture();
    let good = write_file(&fx.tests, "good.txt", "hello\n");
    write_file(&fx.tests, "good.txt.ref", "hello\n");
    let known_bad = write_file(&fx.tests, "known_bad.txt", "x\n");
    let known_bad_ref = write_file(&fx.tests, "known_bad.txt.ref", "y\n");
    let broken = write_file(&fx.tests, "broken.txt", "z\n");

    let factories: Vec<Box<dyn TestFactory>> = vec![Box::new(OptitestFactory)];
    let tests = discovery::create_tests(&[&fx.tests], &factories, &fx.defaults);
    // `.ref` files are not tests.
    assert_eq!(tests.len(), 3);

    let mut expectations = Expectations::new();
    expectations.insert(
        id(&known_bad),
        format!("optitest: output differs from reference {}", known_bad_ref.display()),
    );

    let reports = run_tests(
        tests,
        2,
        &expectations,
        Arc::new(CpuLock::new()),
        CancellationToken::new(),
    )
    .await;

    let ids: Vec<_> = reports.iter().map(|r| r.id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let status = |path: &Path| {
        reports
            .iter()
            .find(|r| r.id == id(path))
            .map(|r| r.status)
            .unwrap()
    };
    assert_eq!(status(&good), TestStatus::Passed);
    assert_eq!(status(&known_bad), TestStatus::ExpectedFailure);
    assert_eq!(status(&broken), TestStatus::UnexpectedFailure);

    let broken_report = reports.iter().find(|r| r.id == id(&broken)).unwrap();
    assert!(broken_report.result.starts_with("optitest: reference output"));
    assert_eq!(broken_report.stdout, "z\n");
    assert_eq!(broken_report.steps.len(), 1);
    assert_eq!(broken_report.steps[0].retcode, Some(0));
}

#[tokio::test]
async fn test_expected_failure_that_passes_is_unexpected() {
    let fx = fixture();
    let good = write_file(&fx.tests, "good.txt", "hello\n");
    write_file(&fx.tests, "good.txt.ref", "hello\n");

    let factories: Vec<Box<dyn TestFactory>> = vec![Box::new(OptitestFactory)];
    let tests = discovery::create_tests(&[&fx.tests], &factories, &fx.defaults);
    let expectations: Expectations = [(id(&good), "optitest: exit code 1".to_string())]
        .into_iter()
        .collect();

    let reports = run_tests(
        tests,
        1,
        &expectations,
        Arc::new(CpuLock::new()),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, TestStatus::UnexpectedPass);
    assert!(reports[0].status.is_unexpected());
}

#[tokio::test]
async fn test_cancelled_run_skips_everything() {
    let fx = fixture();
    write_file(&fx.tests, "a.txt", "a\n");
    write_file(&fx.tests, "b.txt", "b\n");

    let factories: Vec<Box<dyn TestFactory>> = vec![Box::new(OptitestFactory)];
    let tests = discovery::create_tests(&[&fx.tests], &factories, &fx.defaults);

    let stop = CancellationToken::new();
    stop.cancel();
    let reports = run_tests(tests, 4, &Expectations::new(), Arc::new(CpuLock::new()), stop).await;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.status == TestStatus::Skipped));
}

#[tokio::test]
async fn test_c_pipeline_with_reference_output() {
    let fx = fixture();
    let hello = write_file(&fx.tests, "hello.c", "int main(void) { return 0; }\n");
    write_file(&fx.tests, "hello.c.ref", "hello\n");
    let wrong = write_file(&fx.tests, "wrong.c", "int main(void) { return 0; }\n");
    write_file(&fx.tests, "wrong.c.ref", "goodbye\n");
    let unchecked = write_file(&fx.tests, "unchecked.c", "int main(void) { return 0; }\n");

    let tests = discovery::create_tests(&[&fx.tests], &plugins::default_factories(), &fx.defaults);
    assert_eq!(tests.len(), 3);

    let reports = run_tests(
        tests,
        3,
        &Expectations::new(),
        Arc::new(CpuLock::new()),
        CancellationToken::new(),
    )
    .await;

    let report = |path: &Path| reports.iter().find(|r| r.id == id(path)).unwrap();
    assert_eq!(report(&hello).status, TestStatus::Passed, "{:?}", report(&hello));
    assert_eq!(report(&unchecked).status, TestStatus::Passed);
    assert!(report(&wrong).result.starts_with("execute: output differs from reference"));
    assert_eq!(
        report(&hello).steps.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["compile", "execute"]
    );
}

#[test]
fn test_c_factories_build_expected_steps() {
    let fx = fixture();
    let source = write_file(&fx.tests, "loop.cpp", "int main() {}\n");
    write_file(&fx.tests, "loop.cpp.ref", "");

    let mut defaults = fx.defaults.clone();
    defaults.set("cpu_exclusive", true).unwrap();
    defaults.set("run_retries", 3).unwrap();

    assert!(!CFactory.matches(&source));
    assert!(CxxFactory.matches(&source));
    let test = CxxFactory.create(&source, &defaults).unwrap();

    let steps = test.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].name(), "compile");
    assert_eq!(steps[0].check_count(), 1);
    assert!(!steps[0].is_cpu_exclusive());
    assert_eq!(steps[1].name(), "execute");
    assert_eq!(steps[1].check_count(), 2);
    assert!(steps[1].is_cpu_exclusive());
    assert_eq!(steps[1].allow_retries(), 3);
}

#[test]
fn test_discovery_skips_unclaimed_files_and_missing_dirs() {
    let fx = fixture();
    write_file(&fx.tests, "notes.md", "not a test\n");
    write_file(&fx.tests, "main.c", "int main(void) { return 0; }\n");

    let dirs = [fx.tests.clone(), fx.tests.join("does-not-exist")];
    let tests = discovery::create_tests(&dirs, &plugins::default_factories(), &fx.defaults);
    assert_eq!(tests.len(), 1);
    assert!(tests[0].id().ends_with("main.c"));
}

#[test]
fn test_factory_lookup() {
    for name in plugins::FACTORY_NAMES {
        let factory = plugins::factory_by_name(name).unwrap();
        assert_eq!(factory.name(), *name);
    }
    assert!(plugins::factory_by_name("fortran").is_none());
}

#[test]
fn test_fractional_run_timeout_rounds_up() {
    let fx = fixture();
    let probe = write_script(&fx.tests, "limits.sh", "ulimit -t");

    let mut env = Environment::from_iter([
        ("testname", Value::from("limits")),
        ("executable", Value::from(probe.display().to_string())),
        ("run_timeout", Value::from(2.5)),
    ]);
    let result = plugins::c::step_run_executable(&mut env).unwrap();

    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.retcode(), Some(0));
    assert_eq!(result.stdout(), b"3\n");
}

#[test]
fn test_mistyped_c_settings_are_reported() {
    let fx = fixture();
    let source = write_file(&fx.tests, "main.c", "int main(void) { return 0; }\n");

    let mut defaults = fx.defaults.clone();
    defaults.set("cpu_exclusive", 1).unwrap();
    let err = CFactory.create(&source, &defaults).unwrap_err();
    assert!(format!("{err:#}").contains("setting 'cpu_exclusive' is not a boolean"));

    let mut defaults = fx.defaults.clone();
    defaults.set("run_retries", -2).unwrap();
    let err = CFactory.create(&source, &defaults).unwrap_err();
    assert!(format!("{err:#}").contains("run_retries"));

    // Discovery logs the failure and skips the file.
    let tests = discovery::create_tests(&[&fx.tests], &plugins::default_factories(), &defaults);
    assert!(tests.is_empty());
}

#[tokio::test]
async fn test_panicking_step_reported_as_internal_error() {
    let mut test = Test::new("panics");
    test.add_step("execute", |_env: &mut Environment| -> sisyphus::core::error::Result<StepResult> {
        panic!("step function bug")
    })
    .unwrap();

    let reports = run_tests(
        vec![test],
        1,
        &Expectations::new(),
        Arc::new(CpuLock::new()),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, TestStatus::UnexpectedFailure);
    assert!(reports[0].result.starts_with("internal error"));
}
