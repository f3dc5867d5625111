//! # Suite Configuration Module / 测试套件配置模块
//!
//! The TOML file describing a suite: where tests live, default settings for
//! every test environment and the results known test failures are expected
//! to produce.
//!
//! 描述测试套件的 TOML 文件：测试所在目录、每个测试环境的默认配置，
//! 以及已知失败测试的期望结果。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::environment::{Environment, Value};
use crate::core::suite::Expectations;

/// Represents the entire suite configuration, loaded from a TOML file.
///
/// ```toml
/// language = "en"
/// jobs = 4
/// dirs = ["optitest"]
/// factories = ["optitest"]
///
/// [environment]
/// cc = "clang"
/// cflags = "-O2"
///
/// [expectations]
/// "optitest/loop.c" = "optitest: exit code 1"
/// ```
///
/// 代表从 TOML 文件加载的整个测试套件配置。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SuiteConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// Unset means `--lang`, or the system locale.
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default)]
    pub language: Option<String>,

    /// Maximum number of tests in flight. Defaults to the CPU count.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Directories scanned for tests.
    /// 扫描测试的目录。
    #[serde(default)]
    pub dirs: Vec<PathBuf>,

    /// Test factories to use, by name (`c`, `cxx`, `optitest`). Empty means
    /// the C and C++ factories.
    #[serde(default)]
    pub factories: Vec<String>,

    /// Refuse to overwrite settings once set.
    #[serde(default)]
    pub override_protection: bool,

    /// Settings merged over the built-in defaults of every test.
    #[serde(default)]
    pub environment: BTreeMap<String, Value>,

    #[serde(default)]
    pub expectations: Expectations,
}

impl SuiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Layers this file's settings over `base` and switches on override
    /// protection afterwards if requested.
    ///
    /// Protection is enabled only once all defaults are in: the file may
    /// replace built-in defaults, tests may not replace what the file set.
    pub fn build_environment(&self, base: &Environment) -> Result<Environment> {
        let mut env = base.clone();
        env.set_protection(false);
        env.merge(self.environment.iter().map(|(k, v)| (k.clone(), v.clone())))?;
        env.set_protection(self.override_protection);
        Ok(env)
    }
}
