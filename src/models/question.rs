use serde::{Deserialize, Serialize};

use crate::models::metrics::{RawMetrics, Strategy};

/// 一道 Jeopardy 风格的题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub category: String,
    pub points: u32,
    pub clue: String,
    pub answer: String,
}

impl std::fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} ${}] {}", self.category, self.points, self.clue)
    }
}

/// `POST /generate-quiz` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub num_questions: u8,
    pub use_rag: bool,
}

impl GenerateRequest {
    /// 为指定策略构建请求；两种策略使用完全相同的主题和题目数量
    pub fn for_strategy(topic: &str, num_questions: u8, strategy: Strategy) -> Self {
        Self {
            topic: topic.to_string(),
            num_questions,
            use_rag: strategy.use_rag(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        if self.use_rag {
            Strategy::Rag
        } else {
            Strategy::Baseline
        }
    }
}

/// `POST /generate-quiz` 成功响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub questions: Vec<QuestionRecord>,
    pub metrics: RawMetrics,
}

impl GenerateResponse {
    /// 检查响应是否可以提交到对比结果中
    ///
    /// # 返回
    /// 不符合约定时返回原因描述
    pub fn check(&self, expected: Strategy) -> Result<(), String> {
        if self.questions.is_empty() {
            return Err("题目列表为空".to_string());
        }
        if let Some(q) = self.questions.iter().find(|q| q.points == 0) {
            return Err(format!("题目分值必须大于 0: {}", q.clue));
        }
        if self.metrics.method != expected {
            return Err(format!(
                "指标来源不匹配: 期望 {}，实际 {}",
                expected, self.metrics.method
            ));
        }
        Ok(())
    }
}

/// 单个策略的完整结果（题目与指标只能一起出现）
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub questions: Vec<QuestionRecord>,
    pub metrics: RawMetrics,
}

impl From<GenerateResponse> for StrategyResult {
    fn from(resp: GenerateResponse) -> Self {
        Self {
            questions: resp.questions,
            metrics: resp.metrics,
        }
    }
}

/// 两种策略的对比结果
///
/// 只有两边都成功时才会构造，视图层不会看到"半个对比"
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub rag: StrategyResult,
    pub baseline: StrategyResult,
}

impl Comparison {
    pub fn get(&self, strategy: Strategy) -> &StrategyResult {
        match strategy {
            Strategy::Rag => &self.rag,
            Strategy::Baseline => &self.baseline,
        }
    }
}
