/// 出题服务 API 客户端
///
/// 封装所有与远程生成服务相关的调用逻辑
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    GenerateRequest, GenerateResponse, MetricsHistory, UploadBatch, UploadResult,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::future::Future;
use tracing::{debug, warn};

pub const UPLOAD_ENDPOINT: &str = "/upload";
pub const GENERATE_ENDPOINT: &str = "/generate-quiz";
pub const METRICS_ENDPOINT: &str = "/metrics";

/// 远程生成服务的调用契约
///
/// 编排层只依赖这个 trait，测试时注入假的实现
pub trait QuizService: Send + Sync {
    /// 以一个 multipart 请求上传整批文件
    fn upload(&self, batch: &UploadBatch) -> impl Future<Output = AppResult<UploadResult>> + Send;

    /// 按请求中的策略生成一组题目
    fn generate(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = AppResult<GenerateResponse>> + Send;

    /// 获取服务端累计的历史统计
    fn metrics_history(&self) -> impl Future<Output = AppResult<MetricsHistory>> + Send;
}

/// 基于 reqwest 的服务客户端
pub struct HttpQuizClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuizClient {
    /// 创建新的服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Other(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 构建上传表单，每个文件一个 `files` 字段
    fn build_upload_form(batch: &UploadBatch) -> AppResult<Form> {
        let mut form = Form::new();
        for file in batch.files() {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(file.media_type)
                .map_err(|e| AppError::api_request_failed(UPLOAD_ENDPOINT, e))?;
            form = form.part("files", part);
        }
        Ok(form)
    }

    /// 读取响应体并按状态码解码
    async fn read_response<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        debug!("{} 响应: status={}, 长度={} 字节", endpoint, status, body.len());

        decode_response(endpoint, status, &body)
    }
}

impl QuizService for HttpQuizClient {
    async fn upload(&self, batch: &UploadBatch) -> AppResult<UploadResult> {
        debug!(
            "上传 {} 个文件，共 {} 字节",
            batch.len(),
            batch.total_bytes()
        );

        let form = Self::build_upload_form(batch)?;
        let response = self
            .http
            .post(self.url(UPLOAD_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("上传请求失败: {}", e);
                AppError::api_request_failed(UPLOAD_ENDPOINT, e)
            })?;

        Self::read_response(UPLOAD_ENDPOINT, response).await
    }

    async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        debug!(
            "生成请求: topic={}, num_questions={}, use_rag={}",
            request.topic, request.num_questions, request.use_rag
        );

        let response = self
            .http
            .post(self.url(GENERATE_ENDPOINT))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("生成请求失败: {}", e);
                AppError::api_request_failed(GENERATE_ENDPOINT, e)
            })?;

        Self::read_response(GENERATE_ENDPOINT, response).await
    }

    async fn metrics_history(&self) -> AppResult<MetricsHistory> {
        let response = self
            .http
            .get(self.url(METRICS_ENDPOINT))
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(METRICS_ENDPOINT, e))?;

        Self::read_response(METRICS_ENDPOINT, response).await
    }
}

/// 按状态码解码响应体
///
/// 非 2xx 响应尽量从 `{ "detail": ... }` 中取出服务给出的说明
pub fn decode_response<T: DeserializeOwned>(endpoint: &str, status: u16, body: &str) -> AppResult<T> {
    if !(200..300).contains(&status) {
        let detail = parse_error_detail(body);
        warn!("{} 返回错误 {}: {:?}", endpoint, status, detail);
        return Err(AppError::bad_response(endpoint, status, detail));
    }

    serde_json::from_str(body).map_err(|e| AppError::json_parse_failed(endpoint, e))
}

/// 提取错误响应中的 `detail` 字段
///
/// FastAPI 的校验错误里 `detail` 是数组，此时原样转成 JSON 文本
pub fn parse_error_detail(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
