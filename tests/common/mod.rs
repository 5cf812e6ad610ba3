//! 集成测试共用的夹具：用 lopdf 拼出扫描件 PDF，配一个按图像宽度应答的假 OCR 引擎
//!
//! 每一页是一张 `width × PAGE_HEIGHT` 的灰度图，宽度就是这一页的"身份证"：
//! 假引擎按宽度查表返回文本。页眉裁剪后高度小于 `PAGE_HEIGHT`，据此区分页眉调用。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use exam_script_grader::error::OcrError;
use exam_script_grader::{AbortSignal, OcrEngine, OcrOutput, PreprocessHints};
use image::DynamicImage;
use lopdf::{dictionary, Document, Object, Stream};

pub const PAGE_HEIGHT: u32 = 40;

/// 生成一份扫描件 PDF，`widths` 依次为各页图像宽度
pub fn scanned_pdf(widths: &[u32]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for &width in widths {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => PAGE_HEIGHT as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8i64,
            },
            vec![255u8; (width * PAGE_HEIGHT) as usize],
        );
        let image_id = doc.add_object(image);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), (width as i64).into(), (PAGE_HEIGHT as i64).into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im1" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save fixture pdf");
    bytes
}

/// 没有任何页面的 PDF
pub fn empty_pdf() -> Vec<u8> {
    scanned_pdf(&[])
}

/// 按图像宽度应答的假 OCR 引擎
#[derive(Default)]
pub struct FakeOcrEngine {
    pages: HashMap<u32, OcrOutput>,
    headers: HashMap<u32, String>,
    failing: HashSet<u32>,
    /// 某宽度在返回正文前先返回几次空文本
    blank_before: Mutex<HashMap<u32, usize>>,
    /// 识别正文时触发中止，模拟批改途中收到 Ctrl+C
    abort_on_page: Option<AbortSignal>,
    pub calls: AtomicUsize,
    pub contrasts_seen: Mutex<Vec<f32>>,
}

impl FakeOcrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, width: u32, text: impl Into<String>, confidence: f64) -> Self {
        self.pages.insert(width, OcrOutput::new(text, confidence));
        self
    }

    pub fn header(mut self, width: u32, text: impl Into<String>) -> Self {
        self.headers.insert(width, text.into());
        self
    }

    pub fn failing(mut self, width: u32) -> Self {
        self.failing.insert(width);
        self
    }

    pub fn blank_first(self, width: u32, times: usize) -> Self {
        self.blank_before
            .lock()
            .unwrap()
            .insert(width, times);
        self
    }

    pub fn abort_while_reading(mut self, signal: AbortSignal) -> Self {
        self.abort_on_page = Some(signal);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeOcrEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn recognize(&self, image: &DynamicImage, hints: &PreprocessHints) -> Result<OcrOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contrasts_seen.lock().unwrap().push(hints.contrast);

        let width = image.width();
        if self.failing.contains(&width) {
            return Err(OcrError::Unavailable {
                engine: "fake".to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "ocr service down",
                )),
            });
        }

        if image.height() < PAGE_HEIGHT {
            let text = self.headers.get(&width).cloned().unwrap_or_default();
            return Ok(OcrOutput::new(text, 0.95));
        }

        if let Some(signal) = &self.abort_on_page {
            signal.abort();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        {
            let mut blanks = self.blank_before.lock().unwrap();
            if let Some(remaining) = blanks.get_mut(&width) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(OcrOutput::new("", 0.1));
                }
            }
        }

        Ok(self
            .pages
            .get(&width)
            .cloned()
            .unwrap_or_else(|| OcrOutput::new("", 0.0)))
    }
}

/// 一段足够长、没有乱码的答案
pub fn long_answer(topic: &str) -> String {
    vec![format!("the writer explains {} with clear reasons", topic); 8].join(". ")
}

/// 三个标记都在、答案完整的一页
pub fn complete_page_text() -> String {
    format!(
        "Summarize the information\n{}\nPublic Transportation In Dhaka\n{}\n\
         An increasing number of people are buying\n{}",
        long_answer("the chart"),
        long_answer("traffic"),
        long_answer("online shopping")
    )
}

pub const VALID_HEADER: &str = "Name: Rahim Uddin\nReg No: 2021331045";
