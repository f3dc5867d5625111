//! # File System Operations Module / 文件系统操作模块
//!
//! Small helpers for the directories tests write into.
//!
//! 测试写入目录的小工具函数。

use std::fs;
use std::io;
use std::path::Path;

/// Creates `dir` and its parents. Succeeds if it already exists as a
/// directory; fails if something else sits at that path.
///
/// 创建 `dir` 及其父目录。若已存在同名目录则成功；若该路径为其他文件则失败。
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if let Err(e) = fs::create_dir_all(dir) {
        if !dir.is_dir() {
            return Err(e);
        }
    }
    if !dir.is_dir() {
        return Err(io::Error::other(format!(
            "Couldn't create test output directory '{}'",
            dir.display()
        )));
    }
    Ok(())
}

/// Ensures the parent directory of `file` exists.
pub fn ensure_parent_dir(file: &Path) -> io::Result<()> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
