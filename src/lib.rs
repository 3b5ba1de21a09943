//! # RAG Quiz Compare
//!
//! 上传文档，用同一主题分别以 RAG 和基线两种策略生成 Jeopardy 风格题目，
//! 并对比两者的 token 用量、耗时和估算成本。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 远程生成服务的访问
//! - `QuizService` - 上传 / 生成 / 历史统计三个能力
//! - `HttpQuizClient` - 基于 reqwest 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `derived_metrics` - 成本、吞吐、差值计算
//! - `ReportWriter` - 写运行日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次运行的状态
//! - `StageTracker` - 阶段状态机
//! - `RunCtx` - 运行上下文（运行标识）
//! - `RevealBoard` - 题板翻开状态
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 上传 → 双策略生成 → 原子提交 → 延迟切换视图
//! - `orchestrator/view_router` - 快照到画面的映射
//! - `orchestrator/app` - 命令行程序入口
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpQuizClient, QuizService};
pub use config::{Config, GenerationMode};
pub use error::{AppError, AppResult};
pub use models::{Comparison, QuestionRecord, Strategy, UploadBatch};
pub use orchestrator::{App, Pipeline, PipelineSnapshot, RunOutcome, Screen};
pub use workflow::PipelineStage;
