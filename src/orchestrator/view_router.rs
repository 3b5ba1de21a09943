//! 视图路由
//!
//! 把阶段状态和已提交的结果映射成展示层要渲染的画面。
//! 派生指标在每次路由时重新计算，不做缓存。

use crate::models::{Comparison, QuestionRecord, Strategy, UploadResult};
use crate::orchestrator::pipeline::{Boards, PipelineSnapshot, View};
use crate::services::derived_metrics::{compute_derived, CostModel, DerivedMetrics};
use crate::workflow::{group_by_category, PipelineStage};

/// 展示层画面
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// 等待用户选择文件
    Idle,
    /// 正在上传/处理文档
    Processing { message: Option<String> },
    /// 正在生成两组题目
    Generating {
        message: Option<String>,
        detail: Option<String>,
    },
    /// 已完成，等待延迟切换到结果视图
    Success { message: Option<String> },
    /// 失败，带重试入口（重试即 reset）
    Failed {
        message: String,
        detail: Option<String>,
    },
    /// 对比结果
    Comparison(Box<ComparisonScreen>),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Idle => "idle",
            Screen::Processing { .. } => "processing",
            Screen::Generating { .. } => "generating",
            Screen::Success { .. } => "success",
            Screen::Failed { .. } => "failed",
            Screen::Comparison(_) => "comparison",
        }
    }
}

/// 对比画面所需的全部数据
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonScreen {
    pub upload: Option<UploadResult>,
    pub comparison: Comparison,
    pub boards: Boards,
    pub derived: DerivedMetrics,
}

impl ComparisonScreen {
    /// 某个题板按分类分组后的布局
    pub fn board_layout(&self, strategy: Strategy) -> Vec<(&str, Vec<(usize, &QuestionRecord)>)> {
        group_by_category(&self.comparison.get(strategy).questions)
    }
}

/// 根据快照计算当前画面
///
/// 只有题目和指标同时存在时才会进入对比画面
pub fn route(snapshot: &PipelineSnapshot, cost_model: &CostModel) -> Screen {
    let status = &snapshot.status;

    match status.stage {
        PipelineStage::Idle => Screen::Idle,
        PipelineStage::Processing => Screen::Processing {
            message: status.message.clone(),
        },
        PipelineStage::Generating => Screen::Generating {
            message: status.message.clone(),
            detail: status.detail.clone(),
        },
        PipelineStage::Error => Screen::Failed {
            message: status
                .message
                .clone()
                .unwrap_or_else(|| "未知错误".to_string()),
            detail: status.detail.clone(),
        },
        PipelineStage::Complete => match (snapshot.view, &snapshot.comparison, &snapshot.boards) {
            (View::Results, Some(comparison), Some(boards)) => {
                let derived =
                    compute_derived(&comparison.rag.metrics, &comparison.baseline.metrics, cost_model);
                Screen::Comparison(Box::new(ComparisonScreen {
                    upload: snapshot.upload.clone(),
                    comparison: comparison.clone(),
                    boards: boards.clone(),
                    derived,
                }))
            }
            _ => Screen::Success {
                message: status.message.clone(),
            },
        },
    }
}
