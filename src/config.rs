use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 两次生成请求的发起方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// 先 RAG 再基线，逐个发起
    #[default]
    Sequential,
    /// 两个请求同时在途
    Concurrent,
}

impl FromStr for GenerationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(GenerationMode::Sequential),
            "concurrent" => Ok(GenerationMode::Concurrent),
            other => Err(ConfigError::EnvVarParseFailed {
                var_name: "GENERATION_MODE".to_string(),
                value: other.to_string(),
                expected_type: "sequential | concurrent".to_string(),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 远程生成服务地址
    pub api_base_url: String,
    /// 出题主题（两种策略共用）
    pub topic: String,
    /// 每种策略生成的题目数量 (1..=10)
    pub num_questions: u8,
    /// 生成请求的发起方式
    pub generation_mode: GenerationMode,
    /// 完成提示的展示时长，之后切换到结果视图
    pub display_delay_ms: u64,
    /// 单个请求的超时时间
    pub request_timeout_secs: u64,
    // --- 成本模型（每百万 token 单价）---
    pub input_rate_per_million: f64,
    pub output_rate_per_million: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            topic: "Key concepts from the uploaded documents".to_string(),
            num_questions: 5,
            generation_mode: GenerationMode::Sequential,
            display_delay_ms: 1500,
            request_timeout_secs: 120,
            input_rate_per_million: 0.125,
            output_rate_per_million: 0.375,
            verbose_logging: false,
            output_log_file: "quiz_report.txt".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：先读取 `QUIZ_CONFIG` 指向的 TOML 文件（可选），再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 仅使用环境变量覆盖默认值
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺省的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        toml::from_str(&content).map_err(|e| {
            AppError::File(crate::error::FileError::TomlParseFailed {
                path: display,
                source: Box::new(e),
            })
        })
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            topic: std::env::var("QUIZ_TOPIC").unwrap_or(self.topic),
            num_questions: env_parse("NUM_QUESTIONS", "u8")?.unwrap_or(self.num_questions),
            generation_mode: match std::env::var("GENERATION_MODE") {
                Ok(v) => v.parse()?,
                Err(_) => self.generation_mode,
            },
            display_delay_ms: env_parse("DISPLAY_DELAY_MS", "u64")?
                .unwrap_or(self.display_delay_ms),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            input_rate_per_million: env_parse("INPUT_RATE_PER_MILLION", "f64")?
                .unwrap_or(self.input_rate_per_million),
            output_rate_per_million: env_parse("OUTPUT_RATE_PER_MILLION", "f64")?
                .unwrap_or(self.output_rate_per_million),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        })
    }

    /// 校验配置取值
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::invalid_config("api_base_url", "不能为空"));
        }
        if self.topic.trim().is_empty() {
            return Err(AppError::invalid_config("topic", "不能为空"));
        }
        if !(1..=10).contains(&self.num_questions) {
            return Err(AppError::invalid_config(
                "num_questions",
                format!("{} 不在 1..=10 范围内", self.num_questions),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::invalid_config("request_timeout_secs", "必须大于 0"));
        }
        if !(self.input_rate_per_million >= 0.0 && self.output_rate_per_million >= 0.0) {
            return Err(AppError::invalid_config("rate_per_million", "单价不能为负数"));
        }
        Ok(())
    }

    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.display_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 读取并解析环境变量；变量不存在时返回 `None`
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
