//! # JSON Reporting Module / JSON 报告模块
//!
//! Writes suite results as a JSON array of test reports.
//!
//! 将套件结果写为测试报告的 JSON 数组。

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::suite::TestReport;
use crate::infra::fs::ensure_parent_dir;

/// Writes `reports` to `output_path`, creating parent directories as needed.
///
/// 将 `reports` 写入 `output_path`，必要时创建父目录。
pub fn write_json_report(reports: &[TestReport], output_path: &Path) -> Result<()> {
    ensure_parent_dir(output_path)
        .with_context(|| format!("Failed to create directory for {}", output_path.display()))?;
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create report file: {}", output_path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, reports).context("Failed to serialize report")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
