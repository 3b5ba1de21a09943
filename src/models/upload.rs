use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 服务端接受的文档类型（扩展名 → MIME）
static ACCEPTED_MEDIA_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "pdf" => "application/pdf",
    "txt" => "text/plain",
    "md" => "text/markdown",
};

/// 根据扩展名判断文档类型，不支持的类型返回 `None`
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    ACCEPTED_MEDIA_TYPES.get(ext.as_str()).copied()
}

/// 待上传的单个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, media_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type,
            bytes,
        }
    }
}

/// 用户一次选中的文件集合
///
/// 只在上传调用期间存在，流程不会保留它
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    files: Vec<UploadFile>,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadFile>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.bytes.len()).sum()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.file_name.as_str()).collect()
    }
}

impl FromIterator<UploadFile> for UploadBatch {
    fn from_iter<I: IntoIterator<Item = UploadFile>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// `POST /upload` 成功响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub message: String,
    pub num_chunks: u64,
    pub files_processed: Vec<String>,
}

impl UploadResult {
    /// 上传结果的简要描述
    pub fn summary(&self) -> String {
        format!(
            "已处理 {} 个分块，来自 {} 个文件",
            self.num_chunks,
            self.files_processed.len()
        )
    }
}
