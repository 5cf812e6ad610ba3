//! OCR 引擎 - 基础设施层
//!
//! 外部 OCR 协作方的边界：输入一张页面（或裁剪区域）图像和预处理提示，
//! 输出 `(text, confidence)`。置信度由引擎给出，这里不计算。

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OcrError;

/// 一次 OCR 调用的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    /// [0, 1]
    pub confidence: f64,
}

impl OcrOutput {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// 预处理提示，随图像一起交给引擎
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessHints {
    /// 对比度调整量，0 表示不调整
    pub contrast: f32,
    /// 是否请求引擎做倾斜校正
    pub deskew: bool,
}

impl Default for PreprocessHints {
    fn default() -> Self {
        Self {
            contrast: 0.0,
            deskew: false,
        }
    }
}

/// OCR 引擎
///
/// 职责：
/// - 只识别单张图像
/// - 不认识答卷、题目
/// - 不做重试（重试由 `TextDigitizer` 负责）
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// 引擎标识，用于日志和错误信息
    fn name(&self) -> &str;

    async fn recognize(&self, image: &DynamicImage, hints: &PreprocessHints) -> Result<OcrOutput, OcrError>;
}

/// 通过 HTTP 调用的 OCR 服务
///
/// 以 PNG 作为请求体 POST 到 `endpoint`，预处理提示放在查询参数里，
/// 响应为 `{"text": "...", "confidence": 0.93}`
pub struct HttpOcrEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrEngine {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Unavailable {
                engine: "http".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn unavailable(&self, source: impl std::error::Error + Send + Sync + 'static) -> OcrError {
        OcrError::Unavailable {
            engine: self.name().to_string(),
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn recognize(&self, image: &DynamicImage, hints: &PreprocessHints) -> Result<OcrOutput, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::BadResponse {
                engine: self.name().to_string(),
                message: format!("PNG 编码失败: {}", e),
            })?;

        debug!(
            "调用 OCR 服务 {}，图像 {}x{}，{} 字节",
            self.endpoint,
            image.width(),
            image.height(),
            png.len()
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("contrast", hints.contrast.to_string()),
                ("deskew", hints.deskew.to_string()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.unavailable(e))?;
        let response = response.error_for_status().map_err(|e| self.unavailable(e))?;
        let output: OcrOutput = response.json().await.map_err(|e| OcrError::BadResponse {
            engine: self.name().to_string(),
            message: e.to_string(),
        })?;

        if !(0.0..=1.0).contains(&output.confidence) {
            return Err(OcrError::BadResponse {
                engine: self.name().to_string(),
                message: format!("置信度超出 [0, 1]: {}", output.confidence),
            });
        }

        Ok(output)
    }
}
