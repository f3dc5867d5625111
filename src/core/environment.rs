//! # Environment Module / 环境模块
//!
//! The settings bag threaded through every step of a test. Step functions
//! read compiler names, flags and paths from it and store derived values
//! (for example the path of a freshly built executable) for later steps.
//!
//! 贯穿测试所有步骤的配置集合。步骤函数从中读取编译器名称、标志和路径，
//! 并为后续步骤存储派生值（例如新构建的可执行文件路径）。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{Error, Result};

/// A single setting value.
/// 单个配置值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Key/value settings for one test.
///
/// With override protection enabled, `set` refuses to replace a key that is
/// already present and returns [`Error::OverrideDisabled`] instead.
///
/// 单个测试的键值配置。启用覆盖保护时，`set` 拒绝替换已存在的键，
/// 并返回 [`Error::OverrideDisabled`]。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    values: BTreeMap<String, Value>,
    protected: bool,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protection(protected: bool) -> Self {
        Self {
            values: BTreeMap::new(),
            protected,
        }
    }

    pub fn set_protection(&mut self, protected: bool) {
        self.protected = protected;
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if self.protected && self.values.contains_key(&key) {
            return Err(Error::OverrideDisabled { key });
        }
        self.values.insert(key, value.into());
        Ok(())
    }

    /// Stores `value` only when `key` is unset. Returns whether it was stored.
    ///
    /// Lets step functions record derived values idempotently, so a retried
    /// step does not trip override protection.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    /// Copies every entry through [`Environment::set`], so protection applies per key.
    /// Stops at the first rejected key.
    pub fn merge<K, V, I>(&mut self, entries: I) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn merge_from(&mut self, other: &Environment) -> Result<()> {
        self.merge(other.iter().map(|(k, v)| (k.to_string(), v.clone())))
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| Error::NoSuchSetting {
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::Str(s) => Ok(s),
            _ => Err(type_error(key, "a string")),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            Value::Int(i) => Ok(*i),
            _ => Err(type_error(key, "an integer")),
        }
    }

    /// Integers are accepted and widened.
    pub fn get_float(&self, key: &str) -> Result<f64> {
        match self.get(key)? {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            _ => Err(type_error(key, "a number")),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(type_error(key, "a boolean")),
        }
    }

    /// Display form of any setting, as used for command-line interpolation.
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key).map(Value::to_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interpolates `$key` and `${key}` references with settings.
    ///
    /// Any reference to a missing key fails with [`Error::NoSuchSetting`].
    ///
    /// 用配置值替换 `$key` 和 `${key}` 引用。引用不存在的键会返回
    /// [`Error::NoSuchSetting`]。
    pub fn expand(&self, template: &str) -> Result<String> {
        shellexpand::env_with_context(template, |name| {
            self.get_string(name).map(Some)
        })
        .map(|expanded| expanded.into_owned())
        .map_err(|e| e.cause)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<Value>,
{
    /// Builds an unprotected environment; later duplicates replace earlier ones.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            protected: false,
        }
    }
}

fn type_error(key: &str, expected: &'static str) -> Error {
    Error::SettingType {
        key: key.to_string(),
        expected,
    }
}
