//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 把配置、HTTP 客户端和流水线组装起来，供命令行程序调用。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化运行日志、创建客户端和流水线
//! 2. **文件加载**：扫描用户给出的路径，组成上传批次
//! 3. **运行流水线**：等待视图切换后按画面输出报告
//! 4. **历史统计**：查询服务端累计指标

use crate::clients::HttpQuizClient;
use crate::config::Config;
use crate::models::load_upload_batch;
use crate::orchestrator::pipeline::{Pipeline, RunOutcome};
use crate::orchestrator::view_router::{route, Screen};
use crate::services::{CostModel, ReportWriter};
use crate::utils::logging::{
    format_comparison_report, format_history_report, init_log_file, log_batch_loaded,
    log_report, log_startup,
};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: Pipeline<HttpQuizClient>,
    report_writer: ReportWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let client = HttpQuizClient::new(&config).context("创建 HTTP 客户端失败")?;
        let report_writer = ReportWriter::with_path(&config.output_log_file);
        let pipeline = Pipeline::new(Arc::new(client), config.clone());

        Ok(Self {
            config,
            pipeline,
            report_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, paths: &[PathBuf]) -> Result<()> {
        info!("\n📁 正在扫描待上传的文件...");
        let batch = load_upload_batch(paths).await?;

        if batch.is_empty() {
            warn!("⚠️ 没有找到可上传的文件（支持 .pdf / .txt / .md），程序结束");
            return Ok(());
        }
        log_batch_loaded(&batch);

        let outcome = self.pipeline.run_pipeline(batch).await;
        info!("流水线结束: {:?}", outcome);

        if outcome == RunOutcome::Completed {
            self.pipeline.wait_for_navigation().await;
        }

        let cost_model = CostModel::from_config(&self.config);
        match route(&self.pipeline.snapshot(), &cost_model) {
            Screen::Comparison(screen) => {
                let report = format_comparison_report(&screen);
                log_report(&report);
                self.report_writer.append("对比报告", &report)?;
                info!("\n日志已保存至: {}", self.config.output_log_file);
                Ok(())
            }
            Screen::Failed { message, detail } => {
                let detail = detail.unwrap_or_else(|| "-".to_string());
                error!("❌ {}: {}", message, detail);
                self.report_writer
                    .append(&message, &detail)
                    .context("写入失败信息时出错")?;
                bail!("{}: {}", message, detail)
            }
            other => {
                warn!("⚠️ 流水线停在 {} 画面", other.name());
                Ok(())
            }
        }
    }

    /// 查询并输出服务端历史统计
    pub async fn show_history(&self) -> Result<()> {
        info!("📊 正在获取历史统计...");
        let history = self
            .pipeline
            .metrics_history()
            .await
            .context("获取历史统计失败")?;

        let report = format_history_report(&history);
        log_report(&report);
        Ok(())
    }
}
