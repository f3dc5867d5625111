//! # Test Discovery Module / 测试发现模块
//!
//! Turns files in test directories into [`Test`]s by asking a list of
//! factories. A file nobody claims, or whose factory fails, is logged and
//! skipped; discovery never aborts the run.
//!
//! 通过一组工厂将测试目录中的文件转换为 [`Test`]。无工厂认领或工厂失败的文件
//! 会被记录并跳过；发现过程不会中止整个运行。

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::environment::Environment;
use crate::core::test::Test;

/// Builds a [`Test`] from a file.
pub trait TestFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this factory handles `path`.
    fn matches(&self, path: &Path) -> bool;

    /// Assembles the test. `defaults` seeds the test's environment.
    fn create(&self, path: &Path, defaults: &Environment) -> Result<Test>;
}

/// Creates a test for `path` with the first matching factory.
///
/// Returns `None` when no factory applies or construction fails.
///
/// 使用第一个匹配的工厂为 `path` 创建测试。无匹配工厂或构建失败时返回 `None`。
pub fn make_test(
    path: &Path,
    factories: &[Box<dyn TestFactory>],
    defaults: &Environment,
) -> Option<Test> {
    let Some(factory) = factories.iter().find(|f| f.matches(path)) else {
        info!(path = %path.display(), "couldn't determine test factory");
        return None;
    };

    match factory.create(path, defaults) {
        Ok(test) => Some(test),
        Err(e) => {
            warn!(
                path = %path.display(),
                factory = factory.name(),
                error = %format!("{e:#}"),
                "couldn't create test"
            );
            None
        }
    }
}

/// Creates tests for every entry of every directory, in file name order.
/// Missing or unreadable directories are logged and skipped.
pub fn create_tests<P: AsRef<Path>>(
    dirs: &[P],
    factories: &[Box<dyn TestFactory>],
    defaults: &Environment,
) -> Vec<Test> {
    let mut tests = Vec::new();
    for dir in dirs {
        let dir = dir.as_ref();
        let entries = match list_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "couldn't read test directory");
                continue;
            }
        };
        tests.extend(
            entries
                .iter()
                .filter_map(|path| make_test(path, factories, defaults)),
        );
    }
    tests
}

fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}
