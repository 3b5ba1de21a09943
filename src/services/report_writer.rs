//! 报告写入服务 - 业务能力层
//!
//! 只负责把格式化好的报告追加到运行日志文件，不关心流程

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 报告写入服务
///
/// 职责：
/// - 将对比报告、失败信息追加到运行日志
/// - 不负责格式化，也不关心流程顺序
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_path: PathBuf,
}

impl ReportWriter {
    /// 使用默认文件 `quiz_report.txt` 创建
    pub fn new() -> Self {
        Self::with_path("quiz_report.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.report_path
    }

    /// 追加一个带标题的段落
    ///
    /// # 参数
    /// - `title`: 段落标题
    /// - `body`: 段落正文（已格式化）
    pub fn append(&self, title: &str, body: &str) -> Result<()> {
        debug!(
            "写入报告: {} | 段落 {} | 长度: {}",
            self.report_path.display(),
            title,
            body.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_path)
            .with_context(|| format!("无法打开报告文件: {}", self.report_path.display()))?;

        let section = format!(
            "{}\n{} - {}\n{}\n{}\n\n",
            "─".repeat(60),
            title,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "─".repeat(60),
            body.trim_end()
        );

        file.write_all(section.as_bytes())
            .with_context(|| format!("写入报告文件失败: {}", self.report_path.display()))?;

        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
