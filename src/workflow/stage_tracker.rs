//! 阶段状态机
//!
//! 持有当前流水线阶段和最近一次的状态描述。
//! 合法转换：
//!
//! ```text
//! idle → processing → generating → complete
//!            │             │
//!            └──→ error ←──┘
//! 任意阶段 ──reset──→ idle
//! ```

use chrono::{DateTime, Local};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    Processing,
    Generating,
    Complete,
    Error,
}

impl PipelineStage {
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Processing => "processing",
            PipelineStage::Generating => "generating",
            PipelineStage::Complete => "complete",
            PipelineStage::Error => "error",
        }
    }

    /// 是否允许从 `self` 直接转换到 `to`（不含 reset）
    pub fn can_transition_to(self, to: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, to),
            (Idle, Processing)
                | (Processing, Generating)
                | (Generating, Complete)
                | (Processing, Error)
                | (Generating, Error)
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 非法的阶段转换
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("非法的阶段转换: {from} → {to}")]
    Illegal {
        from: PipelineStage,
        to: PipelineStage,
    },
}

/// 最近一次状态描述
#[derive(Debug, Clone, PartialEq)]
pub struct StageStatus {
    pub stage: PipelineStage,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub changed_at: DateTime<Local>,
}

impl StageStatus {
    fn new(stage: PipelineStage, message: Option<String>, detail: Option<String>) -> Self {
        Self {
            stage,
            message,
            detail,
            changed_at: Local::now(),
        }
    }
}

/// 阶段状态机
#[derive(Debug, Clone)]
pub struct StageTracker {
    status: StageStatus,
    transitions: Vec<PipelineStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            status: StageStatus::new(PipelineStage::Idle, None, None),
            transitions: vec![PipelineStage::Idle],
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.status.stage
    }

    pub fn status(&self) -> &StageStatus {
        &self.status
    }

    /// 上次 reset 以来经过的阶段（含起点 idle）
    pub fn transitions(&self) -> &[PipelineStage] {
        &self.transitions
    }

    /// 开始上传：idle → processing
    pub fn begin_upload(&mut self, file_count: usize) -> Result<(), TransitionError> {
        self.transition(
            PipelineStage::Processing,
            Some(format!("正在处理 {} 个文档...", file_count)),
            None,
        )
    }

    /// 上传成功：processing → generating
    pub fn upload_succeeded(&mut self, summary: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(
            PipelineStage::Generating,
            Some("正在生成两组题目...".to_string()),
            Some(summary.into()),
        )
    }

    /// 两次生成都成功：generating → complete
    pub fn generation_succeeded(&mut self) -> Result<(), TransitionError> {
        self.transition(
            PipelineStage::Complete,
            Some("题目生成完成".to_string()),
            None,
        )
    }

    /// 失败：processing | generating → error
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Result<(), TransitionError> {
        self.transition(PipelineStage::Error, Some(message.into()), detail)
    }

    /// 用户主动重置，任意阶段 → idle
    pub fn reset(&mut self) {
        debug!("阶段重置: {} → idle", self.status.stage);
        self.status = StageStatus::new(PipelineStage::Idle, None, None);
        self.transitions = vec![PipelineStage::Idle];
    }

    fn transition(
        &mut self,
        to: PipelineStage,
        message: Option<String>,
        detail: Option<String>,
    ) -> Result<(), TransitionError> {
        let from = self.status.stage;
        if !from.can_transition_to(to) {
            return Err(TransitionError::Illegal { from, to });
        }

        debug!("阶段转换: {} → {}", from, to);
        self.status = StageStatus::new(to, message, detail);
        self.transitions.push(to);
        Ok(())
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
