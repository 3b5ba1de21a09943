use rag_quiz_compare::config::{Config, GenerationMode};
use rag_quiz_compare::error::{AppError, AppResult};
use rag_quiz_compare::models::{
    GenerateRequest, GenerateResponse, MetricsHistory, QuestionRecord, RawMetrics, Strategy,
    UploadBatch, UploadFile, UploadResult,
};
use rag_quiz_compare::orchestrator::{route, Pipeline, RunOutcome, Screen, View};
use rag_quiz_compare::services::CostModel;
use rag_quiz_compare::{logger, HttpQuizClient, PipelineStage, QuizService};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_test::assert_ok;

/// 假服务对单个调用的应答方式
#[derive(Debug, Clone, Copy)]
enum Reply {
    Ok,
    /// 非 2xx，带可选的 `detail`
    Fail(u16, Option<&'static str>),
    /// 返回空题目列表
    Empty,
}

/// 生成调用的闸门：调用进入时放一个 `entered` 许可，然后等待 `release`
struct Gate {
    entered: Semaphore,
    release: Semaphore,
}

impl Gate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        })
    }
}

/// 注入流水线的假服务
struct FakeService {
    upload: Reply,
    rag: Reply,
    baseline: Reply,
    gate: Option<Arc<Gate>>,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    fn new() -> Self {
        Self {
            upload: Reply::Ok,
            rag: Reply::Ok,
            baseline: Reply::Ok,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_upload(mut self, reply: Reply) -> Self {
        self.upload = reply;
        self
    }

    fn with_rag(mut self, reply: Reply) -> Self {
        self.rag = reply;
        self
    }

    fn with_baseline(mut self, reply: Reply) -> Self {
        self.baseline = reply;
        self
    }

    fn with_gate(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn questions() -> Vec<QuestionRecord> {
    [("Rome", 100), ("Rome", 200), ("Greece", 100)]
        .into_iter()
        .map(|(category, points)| QuestionRecord {
            category: category.to_string(),
            points,
            clue: format!("{} clue for {}", category, points),
            answer: format!("What is {}?", category),
        })
        .collect()
}

fn metrics(strategy: Strategy) -> RawMetrics {
    match strategy {
        Strategy::Rag => RawMetrics {
            method: Strategy::Rag,
            prompt_tokens: 1500,
            completion_tokens: 300,
            total_tokens: 1800,
            time_seconds: 4.5,
            context_length: 5000,
        },
        Strategy::Baseline => RawMetrics {
            method: Strategy::Baseline,
            prompt_tokens: 100,
            completion_tokens: 300,
            total_tokens: 400,
            time_seconds: 1.2,
            context_length: 0,
        },
    }
}

impl QuizService for FakeService {
    async fn upload(&self, batch: &UploadBatch) -> AppResult<UploadResult> {
        self.record(format!("upload:{}", batch.len()));
        match self.upload {
            Reply::Fail(status, detail) => Err(AppError::bad_response(
                "/upload",
                status,
                detail.map(str::to_string),
            )),
            Reply::Ok | Reply::Empty => Ok(UploadResult {
                message: "Documents processed successfully".to_string(),
                num_chunks: 12,
                files_processed: batch.file_names().iter().map(|n| n.to_string()).collect(),
            }),
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        let strategy = request.strategy();
        self.record(format!("generate:{}", strategy));

        if let Some(gate) = &self.gate {
            gate.entered.add_permits(1);
            gate.release.acquire().await.unwrap().forget();
        }

        let reply = match strategy {
            Strategy::Rag => self.rag,
            Strategy::Baseline => self.baseline,
        };
        match reply {
            Reply::Ok => Ok(GenerateResponse {
                questions: questions(),
                metrics: metrics(strategy),
            }),
            Reply::Empty => Ok(GenerateResponse {
                questions: vec![],
                metrics: metrics(strategy),
            }),
            Reply::Fail(status, detail) => Err(AppError::bad_response(
                "/generate-quiz",
                status,
                detail.map(str::to_string),
            )),
        }
    }

    async fn metrics_history(&self) -> AppResult<MetricsHistory> {
        self.record("metrics");
        Ok(MetricsHistory::default())
    }
}

fn test_config(mode: GenerationMode) -> Config {
    Config {
        generation_mode: mode,
        display_delay_ms: 10,
        ..Config::default()
    }
}

fn pdf_batch() -> UploadBatch {
    UploadBatch::new(vec![UploadFile::new(
        "doc.pdf",
        "application/pdf",
        b"%PDF-1.4 fake".to_vec(),
    )])
}

fn build_pipeline(service: FakeService, mode: GenerationMode) -> (Pipeline<FakeService>, Arc<FakeService>) {
    let service = Arc::new(service);
    (Pipeline::new(Arc::clone(&service), test_config(mode)), service)
}

#[tokio::test]
async fn test_scenario_successful_run_reaches_comparison() {
    let (pipeline, service) = build_pipeline(FakeService::new(), GenerationMode::Sequential);

    let outcome = pipeline.run_pipeline(pdf_batch()).await;
    assert_eq!(outcome, RunOutcome::Completed);

    let snapshot = pipeline.snapshot();
    assert_eq!(
        snapshot.transitions,
        vec![
            PipelineStage::Idle,
            PipelineStage::Processing,
            PipelineStage::Generating,
            PipelineStage::Complete
        ]
    );
    let upload = snapshot.upload.as_ref().unwrap();
    assert_eq!(upload.num_chunks, 12);
    assert_eq!(upload.files_processed, vec!["doc.pdf".to_string()]);
    assert_eq!(
        service.calls(),
        vec!["upload:1", "generate:RAG", "generate:No RAG"]
    );

    pipeline.wait_for_navigation().await;
    let Screen::Comparison(screen) = route(&pipeline.snapshot(), &CostModel::default()) else {
        panic!("延迟之后应该显示对比画面");
    };
    assert_eq!(screen.comparison.rag.questions.len(), 3);
    assert_eq!(screen.comparison.baseline.questions.len(), 3);
    assert!((screen.derived.rag.est_cost_per_1k - 0.30).abs() < 1e-9);
    assert!((screen.derived.rag.throughput_tok_per_sec.value().unwrap() - 400.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_scenario_upload_rejected_by_service() {
    let service = FakeService::new().with_upload(Reply::Fail(400, Some("unsupported file type")));
    let (pipeline, service) = build_pipeline(service, GenerationMode::Sequential);

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Failed);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.stage(), PipelineStage::Error);
    assert_eq!(snapshot.status.message.as_deref(), Some("文档上传失败"));
    assert_eq!(snapshot.status.detail.as_deref(), Some("unsupported file type"));
    assert!(snapshot.upload.is_none());
    assert!(snapshot.comparison.is_none());
    assert_eq!(service.calls(), vec!["upload:1"]);

    assert_eq!(
        route(&snapshot, &CostModel::default()),
        Screen::Failed {
            message: "文档上传失败".to_string(),
            detail: Some("unsupported file type".to_string()),
        }
    );
}

#[tokio::test]
async fn test_scenario_baseline_failure_discards_rag_half() {
    for mode in [GenerationMode::Sequential, GenerationMode::Concurrent] {
        let service = FakeService::new().with_baseline(Reply::Fail(500, Some("model overloaded")));
        let (pipeline, _) = build_pipeline(service, mode);

        assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Failed);

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.stage(), PipelineStage::Error);
        assert_eq!(snapshot.status.message.as_deref(), Some("题目生成失败 (No RAG)"));
        assert_eq!(snapshot.status.detail.as_deref(), Some("model overloaded"));
        assert!(snapshot.comparison.is_none());
        assert!(snapshot.boards.is_none());
        // 上传结果保留到 reset
        assert!(snapshot.upload.is_some());
        assert!(pipeline.reveal(Strategy::Rag, 0).is_none());
    }
}

#[tokio::test]
async fn test_failure_without_detail_uses_status() {
    let service = FakeService::new().with_rag(Reply::Fail(502, None));
    let (pipeline, service) = build_pipeline(service, GenerationMode::Sequential);

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Failed);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.status.message.as_deref(), Some("题目生成失败 (RAG)"));
    assert_eq!(snapshot.status.detail.as_deref(), Some("HTTP 502"));
    // 顺序模式下 RAG 失败后不再请求基线
    assert_eq!(service.calls(), vec!["upload:1", "generate:RAG"]);
}

#[tokio::test]
async fn test_empty_question_list_is_treated_as_failure() {
    let service = FakeService::new().with_rag(Reply::Empty);
    let (pipeline, _) = build_pipeline(service, GenerationMode::Concurrent);

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Failed);

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.stage(), PipelineStage::Error);
    assert_eq!(snapshot.status.detail.as_deref(), Some("题目列表为空"));
    assert!(snapshot.comparison.is_none());
}

#[tokio::test]
async fn test_scenario_reset_during_generation_discards_late_responses() {
    for mode in [GenerationMode::Sequential, GenerationMode::Concurrent] {
        let gate = Gate::new();
        let service = FakeService::new().with_gate(Arc::clone(&gate));
        let (pipeline, service) = build_pipeline(service, mode);
        let in_flight = match mode {
            GenerationMode::Sequential => 1,
            GenerationMode::Concurrent => 2,
        };

        let (outcome, ()) = tokio::join!(pipeline.run_pipeline(pdf_batch()), async {
            gate.entered.acquire_many(in_flight).await.unwrap().forget();
            assert_eq!(pipeline.stage(), PipelineStage::Generating);

            pipeline.reset();
            assert_eq!(pipeline.stage(), PipelineStage::Idle);

            gate.release.add_permits(2);
        });

        assert_eq!(outcome, RunOutcome::Discarded);

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.stage(), PipelineStage::Idle);
        assert_eq!(snapshot.transitions, vec![PipelineStage::Idle]);
        assert!(snapshot.upload.is_none());
        assert!(snapshot.comparison.is_none());
        assert!(snapshot.boards.is_none());
        assert_eq!(snapshot.view, View::Upload);

        if mode == GenerationMode::Sequential {
            // reset 之后不再发起基线请求
            assert_eq!(service.calls(), vec!["upload:1", "generate:RAG"]);
        }
    }
}

#[tokio::test]
async fn test_concurrent_mode_keeps_both_requests_in_flight() {
    let gate = Gate::new();
    let service = FakeService::new().with_gate(Arc::clone(&gate));
    let (pipeline, _) = build_pipeline(service, GenerationMode::Concurrent);

    let (outcome, ()) = tokio::join!(pipeline.run_pipeline(pdf_batch()), async {
        // 两个请求都已进入，且都还没返回
        gate.entered.acquire_many(2).await.unwrap().forget();
        assert!(pipeline.snapshot().comparison.is_none());
        gate.release.add_permits(2);
    });

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(pipeline.snapshot().comparison.is_some());
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let (pipeline, service) = build_pipeline(FakeService::new(), GenerationMode::Sequential);

    assert_eq!(
        pipeline.run_pipeline(UploadBatch::default()).await,
        RunOutcome::EmptyBatch
    );
    assert_eq!(pipeline.stage(), PipelineStage::Idle);
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_new_run_requires_reset() {
    let (pipeline, service) = build_pipeline(FakeService::new(), GenerationMode::Sequential);
    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Completed);

    assert_eq!(
        pipeline.run_pipeline(pdf_batch()).await,
        RunOutcome::Rejected {
            stage: PipelineStage::Complete
        }
    );
    assert_eq!(service.calls().len(), 3);

    pipeline.reset();
    let first_run = pipeline.snapshot().run_id;
    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Completed);
    assert!(pipeline.snapshot().run_id > first_run);
}

#[tokio::test]
async fn test_reveal_through_pipeline_only_grows() {
    let (pipeline, _) = build_pipeline(FakeService::new(), GenerationMode::Sequential);
    assert!(pipeline.reveal(Strategy::Rag, 0).is_none());

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Completed);

    let picked = pipeline.reveal(Strategy::Rag, 2).unwrap();
    assert_eq!(picked.category, "Greece");
    pipeline.close(Strategy::Rag);
    assert!(pipeline.reveal(Strategy::Rag, 9).is_none());
    assert!(pipeline.reveal(Strategy::Rag, 2).is_some());
    assert!(pipeline.reveal(Strategy::Baseline, 0).is_some());

    let boards = pipeline.snapshot().boards.unwrap();
    assert_eq!(boards.get(Strategy::Rag).revealed_count(), 1);
    assert_eq!(boards.get(Strategy::Rag).selected(), Some(2));
    assert_eq!(boards.get(Strategy::Baseline).revealed_count(), 1);

    pipeline.reset();
    assert!(pipeline.snapshot().boards.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_navigation_waits_for_display_delay() {
    let service = Arc::new(FakeService::new());
    let config = Config {
        display_delay_ms: 1500,
        ..Config::default()
    };
    let pipeline = Pipeline::new(service, config);

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Completed);
    let start = tokio::time::Instant::now();

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.view, View::Upload);
    assert_eq!(route(&snapshot, &CostModel::default()).name(), "success");

    pipeline.wait_for_navigation().await;
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert_eq!(pipeline.snapshot().view, View::Results);
    assert_eq!(
        route(&pipeline.snapshot(), &CostModel::default()).name(),
        "comparison"
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_before_delay_cancels_navigation() {
    let service = Arc::new(FakeService::new());
    let config = Config {
        display_delay_ms: 1500,
        ..Config::default()
    };
    let pipeline = Pipeline::new(service, config);

    assert_eq!(pipeline.run_pipeline(pdf_batch()).await, RunOutcome::Completed);
    pipeline.reset();

    tokio::time::sleep(Duration::from_secs(5)).await;
    pipeline.wait_for_navigation().await;

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.stage(), PipelineStage::Idle);
    assert_eq!(snapshot.view, View::Upload);
    assert_eq!(route(&snapshot, &CostModel::default()), Screen::Idle);
}

#[tokio::test]
async fn test_metrics_history_is_independent_of_pipeline() {
    let (pipeline, service) = build_pipeline(FakeService::new(), GenerationMode::Sequential);

    let history = assert_ok!(pipeline.metrics_history().await);
    assert!(history.is_empty());
    assert_eq!(pipeline.stage(), PipelineStage::Idle);
    assert_eq!(service.calls(), vec!["metrics"]);
}

#[tokio::test]
#[ignore] // 默认忽略，需要本地服务：cargo test -- --ignored
async fn test_real_service_round_trip() {
    logger::init(true);

    let config = Config::load().expect("加载配置失败");
    let client = HttpQuizClient::new(&config).expect("创建客户端失败");
    let pipeline = Pipeline::new(Arc::new(client), config);

    let batch = UploadBatch::new(vec![UploadFile::new(
        "smoke.txt",
        "text/plain",
        b"The Roman Republic was founded in 509 BC.".to_vec(),
    )]);

    let outcome = pipeline.run_pipeline(batch).await;
    assert_eq!(outcome, RunOutcome::Completed, "{:?}", pipeline.snapshot().status);
}
