use crate::error::AppError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 一份上传的答卷：名称 + 原始 PDF 字节
#[derive(Debug, Clone)]
pub struct ScriptUpload {
    /// 由文件名得到，批次内唯一
    pub script_name: String,
    pub bytes: Vec<u8>,
}

impl ScriptUpload {
    pub fn new(script_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            script_name: script_name.into(),
            bytes,
        }
    }
}

/// 从文件夹加载所有 PDF，按文件名排序作为批次顺序
pub async fn load_script_uploads(folder_path: &str) -> Result<Vec<ScriptUpload>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::directory_not_found(folder_path).into());
    }

    let mut pdf_paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_pdf(&path) {
            pdf_paths.push(path);
        }
    }
    pdf_paths.sort();

    let mut uploads = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let script_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        tracing::info!("正在加载: {}", script_name);

        // 读不出来的文件也要占一行，空字节会在流水线里被判为损坏文档
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{}", AppError::file_read_failed(path.display().to_string(), e));
                Vec::new()
            }
        };
        uploads.push(ScriptUpload::new(script_name, bytes));
    }

    Ok(uploads)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
