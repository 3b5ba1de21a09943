//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次对比运行的流程调度和画面路由，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `pipeline` - 流水线编排器
//! - 持有会话状态（阶段、结果缓冲、题板、当前视图）
//! - 上传 → 双策略生成 → 原子提交
//! - 运行标识和过期丢弃
//! - 延迟切换到结果视图
//!
//! ### `view_router` - 视图路由
//! - 把快照映射为要渲染的画面
//! - 每次路由重新计算派生指标
//!
//! ### `app` - 应用入口
//! - 组装配置、客户端和流水线
//! - 输出报告和历史统计
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行入口)
//!     ↓
//! pipeline / view_router (一次运行)
//!     ↓
//! workflow (阶段状态机、运行上下文、题板)
//!     ↓
//! services (派生指标、报告写入)
//!     ↓
//! clients (QuizService / HttpQuizClient)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一写入方**：只有 pipeline 修改会话状态
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **注入服务**：远程服务通过 trait 注入，测试使用替身

pub mod app;
pub mod pipeline;
pub mod view_router;

// 重新导出主要类型
pub use app::App;
pub use pipeline::{Boards, DualOutcome, Pipeline, PipelineSnapshot, RunOutcome, StageFailure, View};
pub use view_router::{route, ComparisonScreen, Screen};
