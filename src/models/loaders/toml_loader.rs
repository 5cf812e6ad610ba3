use crate::error::{AppError, FileError};
use crate::models::exam::{ExamConfig, RawExamConfig};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载考试配置；未提供路径时使用内置三题版式
pub async fn load_exam_config(toml_file_path: Option<&Path>) -> Result<ExamConfig> {
    let Some(path) = toml_file_path else {
        tracing::info!("未指定考试配置，使用内置三题版式");
        return Ok(ExamConfig::default());
    };

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取考试配置: {}", path.display()))?;

    let exam = parse_exam_config(&content, &path.to_string_lossy())
        .with_context(|| format!("无法解析考试配置: {}", path.display()))?;

    tracing::info!(
        "成功加载考试配置 \"{}\"，满分 {}",
        exam.name,
        exam.total_marks()
    );

    Ok(exam)
}

/// 解析并校验 TOML 文本
pub fn parse_exam_config(content: &str, origin: &str) -> Result<ExamConfig, AppError> {
    let raw: RawExamConfig = toml::from_str(content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })
    })?;
    raw.validate()
}
