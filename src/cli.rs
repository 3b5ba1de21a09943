use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, GenerationMode};

#[derive(Parser, Debug)]
#[command(
    name = "rag-quiz",
    version,
    about = "上传文档，对比 RAG 与基线两种策略生成的题目"
)]
pub struct Cli {
    /// 要上传的文件或目录（目录只扫描一层）
    pub paths: Vec<PathBuf>,

    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long)]
    pub num_questions: Option<u8>,

    /// 同时发起两次生成请求
    #[arg(long, default_value_t = false)]
    pub concurrent: bool,

    /// 只查看服务端历史统计
    #[arg(long, default_value_t = false)]
    pub history: bool,
}

impl Cli {
    /// 命令行参数覆盖配置
    pub fn apply(&self, config: &mut Config) {
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if let Some(n) = self.num_questions {
            config.num_questions = n;
        }
        if self.concurrent {
            config.generation_mode = GenerationMode::Concurrent;
        }
    }
}
