use crate::models::upload::{media_type_for, UploadBatch, UploadFile};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个文档，不支持的类型返回 `None`
pub async fn load_upload_file(path: &Path) -> Result<Option<UploadFile>> {
    let Some(media_type) = media_type_for(path) else {
        tracing::warn!("跳过不支持的文件类型: {}", path.display());
        return Ok(None);
    };

    let bytes = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(Some(UploadFile::new(file_name, media_type, bytes)))
}

/// 从文件夹中加载所有支持的文档（不递归）
pub async fn load_folder(folder_path: &Path) -> Result<Vec<UploadFile>> {
    let mut paths = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    // 保证上传顺序稳定
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        if let Some(file) = load_upload_file(&path).await? {
            tracing::info!(
                "正在加载: {} ({} 字节)",
                file.file_name,
                file.bytes.len()
            );
            files.push(file);
        }
    }

    Ok(files)
}

/// 把命令行给出的路径（文件或文件夹）整理成一次上传
pub async fn load_upload_batch(paths: &[PathBuf]) -> Result<UploadBatch> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            anyhow::bail!("路径不存在: {}", path.display());
        }

        if path.is_dir() {
            files.extend(load_folder(path).await?);
        } else if let Some(file) = load_upload_file(path).await? {
            files.push(file);
        }
    }

    tracing::info!("✓ 共选中 {} 个待上传文件", files.len());

    Ok(UploadBatch::new(files))
}
