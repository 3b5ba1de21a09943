//! 流水线编排器 - 编排层
//!
//! ## 职责
//!
//! 驱动"上传 → 双策略生成 → 完成 → 切换视图"整个流程，是会话状态的唯一写入方。
//!
//! ## 核心功能
//!
//! 1. **阶段推进**：每一步远程调用成功后推进 `StageTracker`
//! 2. **双策略生成**：RAG 与基线使用相同参数，顺序或并发发起
//! 3. **原子提交**：两边都成功才提交 `Comparison`，否则一条也不保留
//! 4. **过期丢弃**：每个异步续体都核对运行标识，reset 之后到达的响应直接丢弃
//! 5. **延迟导航**：完成后延迟切换到结果视图，任务绑定运行标识，可被 reset 取消
//!
//! ## 设计特点
//!
//! - 会话状态私有，外部只能拿到快照
//! - 锁不跨越 `.await`
//! - 远程服务通过 `QuizService` 注入

use crate::clients::quiz_client::GENERATE_ENDPOINT;
use crate::clients::QuizService;
use crate::config::{Config, GenerationMode};
use crate::error::{AppError, AppResult};
use crate::models::{
    Comparison, GenerateRequest, GenerateResponse, MetricsHistory, QuestionRecord, Strategy,
    UploadBatch, UploadResult,
};
use crate::workflow::{PipelineStage, RevealBoard, RunCtx, StageStatus, StageTracker};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const UPLOAD_FAILED: &str = "文档上传失败";

/// 展示层当前所在的视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Upload,
    Results,
}

/// 一次 `run_pipeline` 调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 空批次，什么也没做
    EmptyBatch,
    /// 当前阶段不允许开始新的运行（需要先 reset）
    Rejected { stage: PipelineStage },
    /// 两组结果已提交，阶段为 complete
    Completed,
    /// 阶段为 error
    Failed,
    /// 运行期间发生了 reset，迟到的响应已丢弃
    Discarded,
}

/// 双策略生成的汇合结果
#[derive(Debug)]
pub enum DualOutcome {
    BothSucceeded {
        rag: GenerateResponse,
        baseline: GenerateResponse,
    },
    OneFailed {
        which: Strategy,
        reason: AppError,
    },
}

impl DualOutcome {
    /// 合并两次调用的结果；两边都失败时报告 RAG 的失败
    pub fn from_results(
        rag: AppResult<GenerateResponse>,
        baseline: AppResult<GenerateResponse>,
    ) -> Self {
        match (rag, baseline) {
            (Ok(rag), Ok(baseline)) => DualOutcome::BothSucceeded { rag, baseline },
            (Err(reason), _) => DualOutcome::OneFailed {
                which: Strategy::Rag,
                reason,
            },
            (Ok(_), Err(reason)) => DualOutcome::OneFailed {
                which: Strategy::Baseline,
                reason,
            },
        }
    }
}

/// 归一化后的失败描述：一行消息加可选的详情
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub message: String,
    pub detail: Option<String>,
}

impl StageFailure {
    /// 服务给出的 `detail` 原样保留，否则使用底层原因描述
    pub fn from_error(message: impl Into<String>, err: &AppError) -> Self {
        let detail = match err.service_detail() {
            Some(detail) => detail.to_string(),
            None => err.describe_cause(),
        };
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}

fn generation_failed_message(which: Strategy) -> String {
    format!("题目生成失败 ({})", which)
}

/// 两个题板的翻开状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boards {
    pub rag: RevealBoard,
    pub baseline: RevealBoard,
}

impl Boards {
    fn for_comparison(comparison: &Comparison) -> Self {
        Self {
            rag: RevealBoard::new(comparison.rag.questions.len()),
            baseline: RevealBoard::new(comparison.baseline.questions.len()),
        }
    }

    pub fn get(&self, strategy: Strategy) -> &RevealBoard {
        match strategy {
            Strategy::Rag => &self.rag,
            Strategy::Baseline => &self.baseline,
        }
    }

    fn get_mut(&mut self, strategy: Strategy) -> &mut RevealBoard {
        match strategy {
            Strategy::Rag => &mut self.rag,
            Strategy::Baseline => &mut self.baseline,
        }
    }
}

/// 会话状态（只由 `Pipeline` 修改）
#[derive(Debug, Default)]
struct Session {
    run_id: u64,
    tracker: StageTracker,
    upload: Option<UploadResult>,
    comparison: Option<Comparison>,
    boards: Option<Boards>,
    view: View,
    navigation: Option<JoinHandle<()>>,
}

impl Session {
    /// 续体是否仍属于当前运行，且阶段符合预期
    fn is_current(&self, ctx: &RunCtx, expected: PipelineStage) -> bool {
        self.run_id == ctx.run_id && self.tracker.stage() == expected
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 会话的只读快照
#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    pub run_id: u64,
    pub status: StageStatus,
    pub transitions: Vec<PipelineStage>,
    pub upload: Option<UploadResult>,
    pub comparison: Option<Comparison>,
    pub boards: Option<Boards>,
    pub view: View,
}

impl PipelineSnapshot {
    pub fn stage(&self) -> PipelineStage {
        self.status.stage
    }
}

/// 流水线编排器
pub struct Pipeline<S> {
    service: Arc<S>,
    session: Arc<Mutex<Session>>,
    config: Config,
}

impl<S: QuizService> Pipeline<S> {
    /// 创建新的编排器
    pub fn new(service: Arc<S>, config: Config) -> Self {
        Self {
            service,
            session: Arc::new(Mutex::new(Session::default())),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    /// 获取当前会话快照
    pub fn snapshot(&self) -> PipelineSnapshot {
        let session = self.lock();
        PipelineSnapshot {
            run_id: session.run_id,
            status: session.tracker.status().clone(),
            transitions: session.tracker.transitions().to_vec(),
            upload: session.upload.clone(),
            comparison: session.comparison.clone(),
            boards: session.boards.clone(),
            view: session.view,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.lock().tracker.stage()
    }

    /// 运行完整流水线
    ///
    /// # 参数
    /// - `batch`: 用户选中的文件，上传后即被丢弃
    ///
    /// # 返回
    /// 返回本次调用的结果；状态变化通过快照读取
    pub async fn run_pipeline(&self, batch: UploadBatch) -> RunOutcome {
        if batch.is_empty() {
            warn!("⚠️ 没有可上传的文件，忽略本次操作");
            return RunOutcome::EmptyBatch;
        }

        let ctx = match self.start_run(batch.len()) {
            Ok(ctx) => ctx,
            Err(stage) => return RunOutcome::Rejected { stage },
        };

        // ========== 阶段 1: 上传 ==========
        info!("{} 📤 正在上传 {} 个文件...", ctx, ctx.file_count);
        let uploaded = self.service.upload(&batch).await;
        drop(batch);

        let upload = match uploaded {
            Ok(upload) => upload,
            Err(e) => {
                let failure = StageFailure::from_error(UPLOAD_FAILED, &e);
                return self.fail(&ctx, PipelineStage::Processing, failure);
            }
        };

        if !self.commit_upload(&ctx, upload) {
            return RunOutcome::Discarded;
        }

        // ========== 阶段 2: 双策略生成 ==========
        let Some(outcome) = self.generate_both(&ctx).await else {
            return RunOutcome::Discarded;
        };

        match outcome {
            DualOutcome::BothSucceeded { rag, baseline } => {
                self.commit_comparison(&ctx, rag, baseline)
            }
            DualOutcome::OneFailed { which, reason } => {
                let failure = StageFailure::from_error(generation_failed_message(which), &reason);
                self.fail(&ctx, PipelineStage::Generating, failure)
            }
        }
    }

    /// 用户主动重置：回到 idle 并清空所有结果
    ///
    /// 正在途中的响应会因运行标识变化而被丢弃
    pub fn reset(&self) {
        let mut session = self.lock();
        session.run_id += 1;
        session.tracker.reset();
        session.upload = None;
        session.comparison = None;
        session.boards = None;
        session.view = View::Upload;
        if let Some(handle) = session.navigation.take() {
            handle.abort();
        }
        info!("🔄 流水线已重置 (运行 #{} 起生效)", session.run_id);
    }

    /// 翻开某个题板上的一道题
    ///
    /// # 返回
    /// 返回被选中的题目；没有结果或下标越界时返回 `None`
    pub fn reveal(&self, strategy: Strategy, index: usize) -> Option<QuestionRecord> {
        let mut guard = self.lock();
        let session = &mut *guard;
        let comparison = session.comparison.as_ref()?;
        let boards = session.boards.as_mut()?;

        if !boards.get_mut(strategy).reveal(index) {
            return None;
        }
        comparison.get(strategy).questions.get(index).cloned()
    }

    /// 关闭某个题板的弹窗
    pub fn close(&self, strategy: Strategy) {
        if let Some(boards) = self.lock().boards.as_mut() {
            boards.get_mut(strategy).close();
        }
    }

    /// 等待已安排的视图切换执行完毕（没有安排时立即返回）
    pub async fn wait_for_navigation(&self) {
        let handle = self.lock().navigation.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("视图切换任务异常结束: {}", e);
                }
            }
        }
    }

    /// 获取服务端历史统计（与流水线状态无关）
    pub async fn metrics_history(&self) -> AppResult<MetricsHistory> {
        self.service.metrics_history().await
    }

    // ========== 内部步骤 ==========

    /// idle → processing，并分配新的运行标识
    fn start_run(&self, file_count: usize) -> Result<RunCtx, PipelineStage> {
        let mut session = self.lock();
        if let Err(e) = session.tracker.begin_upload(file_count) {
            warn!("⚠️ 当前阶段不能开始新的运行: {}", e);
            return Err(session.tracker.stage());
        }
        session.run_id += 1;
        Ok(RunCtx::new(session.run_id, file_count))
    }

    /// 保存上传结果：processing → generating
    fn commit_upload(&self, ctx: &RunCtx, upload: UploadResult) -> bool {
        let mut session = self.lock();
        if !session.is_current(ctx, PipelineStage::Processing) {
            warn!("{} ⚠️ 上传响应已过期，丢弃", ctx);
            return false;
        }

        let summary = upload.summary();
        if let Err(e) = session.tracker.upload_succeeded(summary.clone()) {
            error!("{} {}", ctx, e);
            return false;
        }

        info!("{} ✓ 上传完成: {}", ctx, summary);
        session.upload = Some(upload);
        true
    }

    /// 发起两次生成；运行在途中被 reset 时返回 `None`
    async fn generate_both(&self, ctx: &RunCtx) -> Option<DualOutcome> {
        match self.config.generation_mode {
            GenerationMode::Concurrent => {
                info!("{} ⚡ 同时发起 RAG 与基线生成请求...", ctx);
                let (rag, baseline) = futures::future::join(
                    self.generate_checked(Strategy::Rag),
                    self.generate_checked(Strategy::Baseline),
                )
                .await;
                Some(DualOutcome::from_results(rag, baseline))
            }
            GenerationMode::Sequential => {
                info!("{} 🤖 正在生成 RAG 题目...", ctx);
                let rag = match self.generate_checked(Strategy::Rag).await {
                    Ok(rag) => rag,
                    Err(reason) => {
                        return Some(DualOutcome::OneFailed {
                            which: Strategy::Rag,
                            reason,
                        })
                    }
                };

                let still_current = self.lock().is_current(ctx, PipelineStage::Generating);
                if !still_current {
                    warn!("{} ⚠️ 运行已被重置，不再发起基线请求", ctx);
                    return None;
                }

                info!("{} 🤖 正在生成基线题目...", ctx);
                let baseline = self.generate_checked(Strategy::Baseline).await;
                Some(DualOutcome::from_results(Ok(rag), baseline))
            }
        }
    }

    /// 调用生成接口并检查响应内容
    async fn generate_checked(&self, strategy: Strategy) -> AppResult<GenerateResponse> {
        let request =
            GenerateRequest::for_strategy(&self.config.topic, self.config.num_questions, strategy);

        let response = self.service.generate(&request).await?;
        response
            .check(strategy)
            .map_err(|reason| AppError::malformed_payload(GENERATE_ENDPOINT, reason))?;

        debug!(
            "{} 生成返回 {} 道题, {} tokens, 用时 {:.2}s",
            strategy,
            response.questions.len(),
            response.metrics.total_tokens,
            response.metrics.time_seconds
        );

        Ok(response)
    }

    /// 原子提交两组结果：generating → complete，并安排视图切换
    fn commit_comparison(
        &self,
        ctx: &RunCtx,
        rag: GenerateResponse,
        baseline: GenerateResponse,
    ) -> RunOutcome {
        let mut session = self.lock();
        if !session.is_current(ctx, PipelineStage::Generating) {
            warn!("{} ⚠️ 生成结果已过期，丢弃", ctx);
            return RunOutcome::Discarded;
        }

        if let Err(e) = session.tracker.generation_succeeded() {
            error!("{} {}", ctx, e);
            return RunOutcome::Discarded;
        }

        let comparison = Comparison {
            rag: rag.into(),
            baseline: baseline.into(),
        };
        info!(
            "{} ✅ 生成完成: RAG {} 道题, 基线 {} 道题",
            ctx,
            comparison.rag.questions.len(),
            comparison.baseline.questions.len()
        );

        session.boards = Some(Boards::for_comparison(&comparison));
        session.comparison = Some(comparison);
        session.navigation = Some(self.schedule_navigation(*ctx));

        RunOutcome::Completed
    }

    /// 延迟切换到结果视图；届时运行已变化则什么也不做
    fn schedule_navigation(&self, ctx: RunCtx) -> JoinHandle<()> {
        let shared = Arc::clone(&self.session);
        let delay = self.config.display_delay();

        tokio::spawn(async move {
            sleep(delay).await;
            let mut session = lock_session(&shared);
            if session.is_current(&ctx, PipelineStage::Complete) {
                session.view = View::Results;
                info!("{} 📊 切换到结果视图", ctx);
            } else {
                debug!("{} 视图切换已过期，忽略", ctx);
            }
        })
    }

    /// 进入 error 阶段；续体已过期时丢弃
    fn fail(&self, ctx: &RunCtx, expected: PipelineStage, failure: StageFailure) -> RunOutcome {
        let mut session = self.lock();
        if !session.is_current(ctx, expected) {
            warn!("{} ⚠️ 失败响应已过期，丢弃: {}", ctx, failure.message);
            return RunOutcome::Discarded;
        }

        error!(
            "{} ❌ {}: {}",
            ctx,
            failure.message,
            failure.detail.as_deref().unwrap_or("-")
        );

        match session.tracker.fail(failure.message, failure.detail) {
            Ok(()) => RunOutcome::Failed,
            Err(e) => {
                error!("{} {}", ctx, e);
                RunOutcome::Discarded
            }
        }
    }
}
