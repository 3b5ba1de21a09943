//! 流水线运行上下文
//!
//! 封装"我属于哪一次运行"这一信息，每个异步续体都拿它做过期检查

use std::fmt::Display;

/// 流水线运行上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCtx {
    /// 运行标识；reset 或新的运行都会让旧标识失效
    pub run_id: u64,

    /// 本次上传的文件数（仅用于日志显示）
    pub file_count: usize,
}

impl RunCtx {
    pub fn new(run_id: u64, file_count: usize) -> Self {
        Self {
            run_id,
            file_count,
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[运行 #{}]", self.run_id)
    }
}
