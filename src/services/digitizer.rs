//! 文字识别服务 - 业务能力层
//!
//! 包装对 OCR 引擎的调用，负责：
//! - 调用前的轻量预处理（对比度、灰度、倾斜校正提示）
//! - 空文本时的有限次重试（整条流水线唯一的重试点）
//! - 单次调用超时
//! - 把整份答卷的逐页结果拼成全文，并记录每页在全文中的位置和置信度

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::infrastructure::{OcrEngine, OcrOutput, PageImage, PreprocessHints, RasterizedDocument};

/// 页与页之间的分隔行
pub const PAGE_BREAK: &str = "\n\n=== PAGE BREAK ===\n\n";

/// 每次重试增加的对比度
const CONTRAST_STEP: f32 = 30.0;

/// 一页在全文中的位置
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpan {
    pub number: usize,
    /// 该页文本在 `full_text` 中的字节区间
    pub range: Range<usize>,
    /// None 表示该页解码失败或 OCR 不可用
    pub confidence: Option<f64>,
}

impl PageSpan {
    pub fn failed(&self) -> bool {
        self.confidence.is_none()
    }
}

/// 整份答卷的识别结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DigitizedScript {
    pub full_text: String,
    pub pages: Vec<PageSpan>,
}

impl DigitizedScript {
    /// 由逐页结果拼接，`None` 为失败页
    pub fn from_pages(pages: Vec<(usize, Option<OcrOutput>)>) -> Self {
        let mut full_text = String::new();
        let mut spans = Vec::with_capacity(pages.len());

        for (idx, (number, output)) in pages.into_iter().enumerate() {
            if idx > 0 {
                full_text.push_str(PAGE_BREAK);
            }
            let start = full_text.len();
            let confidence = output.map(|o| {
                full_text.push_str(&o.text);
                o.confidence
            });
            spans.push(PageSpan {
                number,
                range: start..full_text.len(),
                confidence,
            });
        }

        Self {
            full_text,
            pages: spans,
        }
    }

    /// 与给定区间有交集的页
    pub fn pages_overlapping<'a>(&'a self, range: &'a Range<usize>) -> impl Iterator<Item = &'a PageSpan> + 'a {
        self.pages.iter().filter(move |page| {
            if page.range.is_empty() {
                range.start <= page.range.start && page.range.start <= range.end
            } else {
                page.range.start < range.end && range.start < page.range.end
            }
        })
    }

    /// 区间覆盖到的页中最低的置信度；没有可用页时为 None
    pub fn confidence_for(&self, range: &Range<usize>) -> Option<f64> {
        self.pages_overlapping(range)
            .filter_map(|page| page.confidence)
            .fold(None, |min, c| Some(min.map_or(c, |m: f64| m.min(c))))
    }

    /// 区间内是否有失败页
    pub fn touches_failed_page(&self, range: &Range<usize>) -> bool {
        self.pages_overlapping(range).any(PageSpan::failed)
    }

    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.failed()).count()
    }
}

/// 置信度限制在 [0, 1]，NaN 与无穷按 0 处理
fn normalize_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 文字识别服务
pub struct TextDigitizer {
    engine: Arc<dyn OcrEngine>,
    max_retries: u32,
    timeout: Duration,
    page_concurrency: usize,
}

impl TextDigitizer {
    pub fn new(engine: Arc<dyn OcrEngine>, max_retries: u32, timeout: Duration, page_concurrency: usize) -> Self {
        Self {
            engine,
            max_retries,
            timeout,
            page_concurrency: page_concurrency.max(1),
        }
    }

    /// 识别一张图像
    ///
    /// 第一次按原图提交；若返回空文本，则提高对比度并请求倾斜校正后重新提交，
    /// 最多重试 `max_retries` 次。引擎报错不重试，直接返回错误。
    pub async fn digitize_image(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError> {
        let mut attempt = 0;
        loop {
            let hints = hints_for_attempt(attempt);
            let prepared = preprocess(image, &hints);
            let output = self.recognize_with_timeout(prepared.as_ref().unwrap_or(image), &hints).await?;

            if !output.text.trim().is_empty() || attempt >= self.max_retries {
                if output.text.trim().is_empty() {
                    debug!("OCR 重试 {} 次后仍为空文本", attempt);
                }
                return Ok(OcrOutput {
                    text: output.text,
                    confidence: normalize_confidence(output.confidence),
                });
            }

            attempt += 1;
            debug!("OCR 返回空文本，第 {} 次重试 (对比度 {})", attempt, hints_for_attempt(attempt).contrast);
        }
    }

    /// 识别首页页眉区域
    pub async fn digitize_header(&self, page: &PageImage, header_fraction: f32) -> Result<OcrOutput, OcrError> {
        let header = page.header_region(header_fraction);
        self.digitize_image(&header).await
    }

    /// 逐页识别整份文档，页内可并发，结果保持文档顺序
    ///
    /// `log_prefix` 只用于日志
    pub async fn digitize_document(&self, document: &RasterizedDocument, log_prefix: &str) -> DigitizedScript {
        let this = self;
        let pages: Vec<(usize, Option<OcrOutput>)> = stream::iter(document.pages().enumerate())
            .map(|(idx, page)| async move {
                match page {
                    Ok(page) => match this.digitize_image(&page.image).await {
                        Ok(output) => (page.number, Some(output)),
                        Err(e) => {
                            warn!("{} 第 {} 页 OCR 失败: {}", log_prefix, page.number, e);
                            (page.number, None)
                        }
                    },
                    Err(e) => {
                        warn!("{} {}", log_prefix, e);
                        (idx + 1, None)
                    }
                }
            })
            .buffered(self.page_concurrency)
            .collect()
            .await;

        DigitizedScript::from_pages(pages)
    }

    async fn recognize_with_timeout(&self, image: &DynamicImage, hints: &PreprocessHints) -> Result<OcrOutput, OcrError> {
        match tokio::time::timeout(self.timeout, self.engine.recognize(image, hints)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout {
                engine: self.engine.name().to_string(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

fn hints_for_attempt(attempt: u32) -> PreprocessHints {
    if attempt == 0 {
        PreprocessHints::default()
    } else {
        PreprocessHints {
            contrast: CONTRAST_STEP * attempt as f32,
            deskew: true,
        }
    }
}

/// 原图不需要改动时返回 None
fn preprocess(image: &DynamicImage, hints: &PreprocessHints) -> Option<DynamicImage> {
    if hints.contrast == 0.0 {
        return None;
    }
    Some(image.grayscale().adjust_contrast(hints.contrast))
}
