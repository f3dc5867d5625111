//! # Plugins Module / 插件模块
//!
//! Test factories for the kinds of tests the tool knows how to build.
//!
//! - `c` - C and C++ sources compiled and run
//! - `optitest` - files fed to an external optimization-test script
//!
//! - `c` - 编译并运行 C 和 C++ 源文件
//! - `optitest` - 交给外部优化测试脚本处理的文件

pub mod c;
pub mod optitest;

use std::path::{Path, PathBuf};

use crate::core::discovery::TestFactory;
use crate::core::environment::{Environment, Value};

/// Names accepted by [`factory_by_name`].
pub const FACTORY_NAMES: &[&str] = &["c", "cxx", "optitest"];

pub fn factory_by_name(name: &str) -> Option<Box<dyn TestFactory>> {
    match name {
        "c" => Some(Box::new(c::CFactory)),
        "cxx" => Some(Box::new(c::CxxFactory)),
        "optitest" => Some(Box::new(optitest::OptitestFactory)),
        _ => None,
    }
}

/// C and C++ factories, the set used when a suite names none.
pub fn default_factories() -> Vec<Box<dyn TestFactory>> {
    vec![Box::new(c::CFactory), Box::new(c::CxxFactory)]
}

/// Built-in settings of every plugin plus the run defaults.
pub fn default_environment() -> Environment {
    let c_env = c::defaults();
    let optitest_env = optitest::defaults();
    c_env
        .iter()
        .chain(optitest_env.iter())
        .map(|(k, v)| (k.to_string(), v.clone()))
        .chain([("run_timeout".to_string(), Value::Int(10))])
        .collect()
}

/// `<path>.ref`, the expected output of a test file.
pub fn reference_path(path: &Path) -> PathBuf {
    let mut reference = path.as_os_str().to_owned();
    reference.push(".ref");
    PathBuf::from(reference)
}
