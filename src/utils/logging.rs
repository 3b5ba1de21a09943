//! 日志工具模块
//!
//! 提供运行日志文件、启动信息和报告格式化的辅助函数
use anyhow::{Context, Result};
use std::fmt::Write;
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::{MethodAverages, MetricsHistory, Strategy, UploadBatch};
use crate::orchestrator::view_router::ComparisonScreen;
use crate::services::derived_metrics::StrategyDerived;

/// 历史为空时的提示
pub const EMPTY_HISTORY_MESSAGE: &str = "暂无历史记录，完成一次题目生成后再来查看";

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n测验对比日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法初始化日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - RAG / 基线出题对比");
    info!("🌐 服务地址: {}", config.api_base_url);
    info!("📝 主题: {}", truncate_text(&config.topic, 40));
    info!("🔢 每组题目数: {}", config.num_questions);
    info!("⚙️ 生成方式: {:?}", config.generation_mode);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
pub fn log_batch_loaded(batch: &UploadBatch) {
    info!(
        "✓ 找到 {} 个待上传的文件 (共 {} 字节)",
        batch.len(),
        batch.total_bytes()
    );
    for name in batch.file_names() {
        info!("  • {}", name);
    }
}

/// 格式化对比报告
///
/// 包含上传摘要、两种策略各自的指标和题板，以及跨策略差值
pub fn format_comparison_report(screen: &ComparisonScreen) -> String {
    let mut out = String::new();

    if let Some(upload) = &screen.upload {
        let _ = writeln!(out, "📤 {}", upload.summary());
        if !upload.files_processed.is_empty() {
            let _ = writeln!(out, "   文件: {}", upload.files_processed.join(", "));
        }
        let _ = writeln!(out);
    }

    for strategy in [Strategy::Rag, Strategy::Baseline] {
        let result = screen.comparison.get(strategy);
        let derived = match strategy {
            Strategy::Rag => &screen.derived.rag,
            Strategy::Baseline => &screen.derived.baseline,
        };

        let _ = writeln!(out, "==== {} ({} 道题) ====", strategy, result.questions.len());
        let m = &result.metrics;
        let _ = writeln!(
            out,
            "Tokens: {} (prompt {} / completion {})",
            m.total_tokens, m.prompt_tokens, m.completion_tokens
        );
        let _ = writeln!(out, "耗时: {:.2}s", m.time_seconds);
        write_derived(&mut out, derived);

        for (category, items) in screen.board_layout(strategy) {
            let _ = writeln!(out, "  [{}]", category);
            for (_, question) in items {
                let _ = writeln!(
                    out,
                    "    ${:<5} {} → {}",
                    question.points,
                    truncate_text(&question.clue, 60),
                    question.answer
                );
            }
        }
        let _ = writeln!(out);
    }

    let delta = &screen.derived.comparison;
    let _ = writeln!(out, "==== RAG 相对基线 ====");
    let _ = writeln!(out, "成本变化: {}", delta.cost_delta_pct.format_pct());
    let _ = writeln!(out, "Token 差值: {:+}", delta.token_delta);
    let _ = writeln!(out, "耗时差值: {:+.2}s", delta.latency_delta_secs);
    let _ = writeln!(out, "Prompt 倍数: {}x", delta.prompt_token_ratio.format(1));

    out
}

fn write_derived(out: &mut String, derived: &StrategyDerived) {
    let _ = writeln!(out, "估算成本 (1000 次): ${:.4}", derived.est_cost_per_1k);
    let throughput = if derived.throughput_tok_per_sec.is_applicable() {
        format!("{} tok/s", derived.throughput_tok_per_sec.format(1))
    } else {
        derived.throughput_tok_per_sec.format(1)
    };
    let _ = writeln!(out, "吞吐: {}", throughput);
    let _ = writeln!(out, "相对基线成本: {}", derived.cost_delta_pct.format_pct());
    let _ = writeln!(out, "上下文长度: {} 字符", derived.context_length);
}

/// 格式化服务端历史统计；没有记录时返回空状态提示
pub fn format_history_report(history: &MetricsHistory) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY_MESSAGE.to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "📊 累计生成次数: {}", history.total_generations);
    write_averages(&mut out, Strategy::Rag, &history.rag);
    write_averages(&mut out, Strategy::Baseline, &history.no_rag);

    let c = &history.comparison;
    let _ = writeln!(out, "---- 对比 ----");
    let _ = writeln!(out, "平均 Token 差值: {:+.1}", c.token_difference);
    let _ = writeln!(out, "平均耗时差值: {:+.2}s", c.time_difference);
    let _ = writeln!(out, "RAG 效率: {:.1}%", c.rag_efficiency);
    out
}

fn write_averages(out: &mut String, strategy: Strategy, avg: &MethodAverages) {
    let _ = writeln!(out, "---- {} ({} 次) ----", strategy, avg.count);
    let _ = writeln!(
        out,
        "平均 Tokens: {:.1} (prompt {:.1} / completion {:.1})",
        avg.avg_tokens, avg.avg_prompt_tokens, avg.avg_completion_tokens
    );
    let _ = writeln!(out, "平均耗时: {:.2}s", avg.avg_time);
}

/// 把多行报告逐行输出到日志
pub fn log_report(report: &str) {
    info!("\n{}", "=".repeat(60));
    for line in report.lines() {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comparison, HistoryComparison, QuestionRecord, RawMetrics, StrategyResult, UploadResult};
    use crate::orchestrator::pipeline::Boards;
    use crate::services::derived_metrics::{compute_derived, CostModel};
    use crate::workflow::RevealBoard;

    fn result(method: Strategy, prompt_tokens: u64, time_seconds: f64) -> StrategyResult {
        StrategyResult {
            questions: vec![QuestionRecord {
                category: "Rome".to_string(),
                points: 100,
                clue: "Founded in 753 BC".to_string(),
                answer: "What is Rome?".to_string(),
            }],
            metrics: RawMetrics {
                method,
                prompt_tokens,
                completion_tokens: 300,
                total_tokens: prompt_tokens + 300,
                time_seconds,
                context_length: if method.use_rag() { 5000 } else { 0 },
            },
        }
    }

    #[test]
    fn test_comparison_report_formats_panel_values() {
        let comparison = Comparison {
            rag: result(Strategy::Rag, 1500, 4.5),
            baseline: result(Strategy::Baseline, 100, 1.2),
        };
        let derived = compute_derived(
            &comparison.rag.metrics,
            &comparison.baseline.metrics,
            &CostModel::default(),
        );
        let screen = ComparisonScreen {
            upload: Some(UploadResult {
                message: "ok".to_string(),
                num_chunks: 12,
                files_processed: vec!["notes.pdf".to_string()],
            }),
            comparison,
            boards: Boards {
                rag: RevealBoard::new(1),
                baseline: RevealBoard::new(1),
            },
            derived,
        };

        let report = format_comparison_report(&screen);
        assert!(report.contains("已处理 12 个分块，来自 1 个文件"));
        assert!(report.contains("$0.3000"));
        assert!(report.contains("$0.1250"));
        assert!(report.contains("400.0 tok/s"));
        assert!(report.contains("+140%"));
        assert!(report.contains("Token 差值: +1400"));
        assert!(report.contains("Prompt 倍数: 15.0x"));
        assert!(report.contains("[Rome]"));
    }

    #[test]
    fn test_history_report_empty_state() {
        assert_eq!(
            format_history_report(&MetricsHistory::default()),
            EMPTY_HISTORY_MESSAGE
        );

        let history = MetricsHistory {
            total_generations: 4,
            rag: MethodAverages {
                count: 2,
                avg_tokens: 1800.0,
                avg_time: 4.5,
                avg_prompt_tokens: 1500.0,
                avg_completion_tokens: 300.0,
            },
            no_rag: MethodAverages {
                count: 2,
                avg_tokens: 400.0,
                avg_time: 1.2,
                avg_prompt_tokens: 100.0,
                avg_completion_tokens: 300.0,
            },
            comparison: HistoryComparison {
                token_difference: 1400.0,
                time_difference: 3.3,
                rag_efficiency: 22.2,
            },
        };
        let report = format_history_report(&history);
        assert!(report.contains("累计生成次数: 4"));
        assert!(report.contains("平均 Token 差值: +1400.0"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }
}
