//! 派生指标计算 - 业务能力层
//!
//! 只负责从两份原始指标推导成本、吞吐和差值，不关心流程
//!
//! 纯函数：没有副作用，相同输入总是得到相同结果。
//! 结果不缓存，每次渲染都重新计算。

use crate::config::Config;
use crate::models::RawMetrics;

/// 派生出的单个数值；输入退化时为"不适用"
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    NotApplicable,
}

impl MetricValue {
    /// 只接受有限数值，其余一律视为不适用
    fn from_finite(v: f64) -> Self {
        if v.is_finite() {
            MetricValue::Value(v)
        } else {
            MetricValue::NotApplicable
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(v),
            MetricValue::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, MetricValue::Value(_))
    }

    /// 按指定小数位格式化，不适用时输出 `n/a`
    pub fn format(self, decimals: usize) -> String {
        match self {
            MetricValue::Value(v) => format!("{:.*}", decimals, v),
            MetricValue::NotApplicable => "n/a".to_string(),
        }
    }

    /// 带符号的百分比，例如 `+140%`
    pub fn format_pct(self) -> String {
        match self {
            MetricValue::Value(v) => format!("{:+.0}%", v),
            MetricValue::NotApplicable => "n/a".to_string(),
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format(1))
    }
}

/// 成本模型
///
/// 单价按每百万 token 计；结果换算为"运行 1000 次"的成本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub input_rate_per_million: f64,
    pub output_rate_per_million: f64,
}

impl CostModel {
    const RUNS: f64 = 1000.0;
    const PER_MILLION: f64 = 1_000_000.0;

    pub fn new(input_rate_per_million: f64, output_rate_per_million: f64) -> Self {
        Self {
            input_rate_per_million,
            output_rate_per_million,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.input_rate_per_million, config.output_rate_per_million)
    }

    /// 运行 1000 次的估算成本
    pub fn cost_per_1k(&self, m: &RawMetrics) -> f64 {
        let input = m.prompt_tokens as f64 / Self::PER_MILLION * self.input_rate_per_million;
        let output = m.completion_tokens as f64 / Self::PER_MILLION * self.output_rate_per_million;
        (input + output) * Self::RUNS
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(0.125, 0.375)
    }
}

/// 单个策略的派生指标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyDerived {
    pub est_cost_per_1k: f64,
    pub throughput_tok_per_sec: MetricValue,
    /// 相对基线的成本变化百分比
    pub cost_delta_pct: MetricValue,
    pub context_length: u64,
}

/// 跨策略差值（RAG 相对基线）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossStrategyDelta {
    pub cost_delta_pct: MetricValue,
    pub token_delta: i64,
    pub latency_delta_secs: f64,
    pub prompt_token_ratio: MetricValue,
}

/// 完整的派生指标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub rag: StrategyDerived,
    pub baseline: StrategyDerived,
    pub comparison: CrossStrategyDelta,
}

/// 吞吐量：token / 秒；耗时为 0、负数或非有限值时不适用
pub fn throughput(m: &RawMetrics) -> MetricValue {
    if !(m.time_seconds.is_finite() && m.time_seconds > 0.0) {
        return MetricValue::NotApplicable;
    }
    MetricValue::from_finite(m.total_tokens as f64 / m.time_seconds)
}

/// 成本变化百分比；基线成本为 0 时不适用
pub fn cost_delta_pct(cost: f64, baseline_cost: f64) -> MetricValue {
    if baseline_cost == 0.0 {
        return MetricValue::NotApplicable;
    }
    MetricValue::from_finite((cost - baseline_cost) / baseline_cost * 100.0)
}

/// 计算两种策略的派生指标
///
/// # 参数
/// - `rag`: RAG 策略的原始指标
/// - `baseline`: 基线策略的原始指标
/// - `cost_model`: 成本模型
pub fn compute_derived(rag: &RawMetrics, baseline: &RawMetrics, cost_model: &CostModel) -> DerivedMetrics {
    let rag_cost = cost_model.cost_per_1k(rag);
    let baseline_cost = cost_model.cost_per_1k(baseline);
    let delta = cost_delta_pct(rag_cost, baseline_cost);

    let prompt_token_ratio = if baseline.prompt_tokens == 0 {
        MetricValue::NotApplicable
    } else {
        MetricValue::from_finite(rag.prompt_tokens as f64 / baseline.prompt_tokens as f64)
    };

    DerivedMetrics {
        rag: StrategyDerived {
            est_cost_per_1k: rag_cost,
            throughput_tok_per_sec: throughput(rag),
            cost_delta_pct: delta,
            context_length: rag.context_length,
        },
        baseline: StrategyDerived {
            est_cost_per_1k: baseline_cost,
            throughput_tok_per_sec: throughput(baseline),
            cost_delta_pct: cost_delta_pct(baseline_cost, baseline_cost),
            context_length: baseline.context_length,
        },
        comparison: CrossStrategyDelta {
            cost_delta_pct: delta,
            token_delta: rag.total_tokens as i64 - baseline.total_tokens as i64,
            latency_delta_secs: rag.time_seconds - baseline.time_seconds,
            prompt_token_ratio,
        },
    }
}
