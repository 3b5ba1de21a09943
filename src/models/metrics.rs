use serde::{Deserialize, Serialize};

/// 生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// 检索增强生成
    #[serde(rename = "rag")]
    Rag,
    /// 不带检索上下文的基线
    #[serde(rename = "no_rag")]
    Baseline,
}

impl Strategy {
    pub fn use_rag(self) -> bool {
        matches!(self, Strategy::Rag)
    }

    /// 展示用标签
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Rag => "RAG",
            Strategy::Baseline => "No RAG",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 单次生成的原始指标，由远程服务给出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub method: Strategy,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub time_seconds: f64,
    pub context_length: u64,
}

/// `GET /metrics` 中单个策略的平均值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodAverages {
    pub count: u64,
    pub avg_tokens: f64,
    pub avg_time: f64,
    pub avg_prompt_tokens: f64,
    pub avg_completion_tokens: f64,
}

/// `GET /metrics` 中的跨策略对比
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryComparison {
    pub token_difference: f64,
    pub time_difference: f64,
    pub rag_efficiency: f64,
}

/// 服务端累计的历史统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsHistory {
    pub total_generations: u64,
    pub rag: MethodAverages,
    pub no_rag: MethodAverages,
    pub comparison: HistoryComparison,
}

impl MetricsHistory {
    /// 服务端还没有任何生成记录
    pub fn is_empty(&self) -> bool {
        self.total_generations == 0
    }
}
