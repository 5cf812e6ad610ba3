//! 单份答卷处理器 - 编排层
//!
//! ## 职责
//!
//! 把一份上传的 PDF 走完整条流水线，得到一条完整的 `ScriptRecord`：
//!
//! 1. **栅格化**：解析 PDF，失败即整卷降级（`corrupt-document`）
//! 2. **身份识别**：首页页眉单独 OCR，提取姓名和学号
//! 3. **文字识别**：逐页 OCR，拼成全文
//! 4. **答案切分**：按标记切出 Q1..Q3
//! 5. **逐题处理**：委托 `QuestionFlow`
//!
//! 任何一步出错都只影响本卷，返回的记录始终包含三道题。

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::infrastructure::{OcrEngine, RasterizedDocument};
use crate::models::exam::ExamConfig;
use crate::models::script::{flags, IdStatus, ScriptRecord};
use crate::models::ScriptUpload;
use crate::services::{AnswerSegmenter, Identity, IdentityExtractor, TextDigitizer};
use crate::workflow::{QuestionFlow, ScriptCtx};

/// 单份答卷的流水线
///
/// 构建一次，在所有并发任务间通过 `Arc` 共享
pub struct ScriptPipeline {
    exam: ExamConfig,
    digitizer: TextDigitizer,
    identity: IdentityExtractor,
    segmenter: AnswerSegmenter,
    question_flow: QuestionFlow,
}

impl ScriptPipeline {
    pub fn new(
        exam: ExamConfig,
        engine: Arc<dyn OcrEngine>,
        page_concurrency: usize,
        verbose_logging: bool,
    ) -> AppResult<Self> {
        let policy = &exam.policy;
        let digitizer = TextDigitizer::new(
            engine,
            policy.max_ocr_retries,
            Duration::from_secs(policy.ocr_timeout_secs),
            page_concurrency,
        );
        let identity = IdentityExtractor::new(&policy.registration_pattern)?;
        let segmenter = AnswerSegmenter::new(&exam)?;
        let question_flow = QuestionFlow::new(&exam, verbose_logging);

        Ok(Self {
            exam,
            digitizer,
            identity,
            segmenter,
            question_flow,
        })
    }

    pub fn exam(&self) -> &ExamConfig {
        &self.exam
    }

    /// 处理一份答卷
    pub async fn process(&self, upload: &ScriptUpload, ctx: &ScriptCtx) -> ScriptRecord {
        info!("{} 📄 开始处理: {}", ctx, upload.script_name);

        // ========== 1. 栅格化 ==========
        let document = match RasterizedDocument::load(&upload.bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!("{} ❌ 文档无法解析，整卷转人工: {}", ctx, e);
                return ScriptRecord::degraded(&upload.script_name, &self.exam, flags::CORRUPT_DOCUMENT);
            }
        };

        if document.is_empty() {
            warn!("{} ⚠️ 文档没有任何页面", ctx);
            return ScriptRecord::degraded(&upload.script_name, &self.exam, flags::EMPTY_DOCUMENT);
        }

        let mut record = ScriptRecord::empty(&upload.script_name, &self.exam);

        // ========== 2. 身份识别 ==========
        let identity = self.identify(&document, ctx).await;
        match identity.id_status {
            IdStatus::Valid => {}
            IdStatus::Missing => record.flag(flags::ID_MISSING),
            IdStatus::Ambiguous => {
                warn!("{} ⚠️ 学号不唯一: {:?}", ctx, identity.candidates);
                record.flag(flags::ID_AMBIGUOUS);
            }
        }
        record.student_name = identity.student_name;
        record.registration_number = identity.registration_number;
        record.id_status = identity.id_status;

        // ========== 3. 文字识别 ==========
        let digitized = self.digitizer.digitize_document(&document, &ctx.to_string()).await;
        let failed = digitized.failed_pages();
        if failed > 0 {
            warn!("{} ⚠️ {}/{} 页识别失败", ctx, failed, document.page_count());
            record.flag(flags::OCR_UNAVAILABLE);
        }

        // ========== 4. 答案切分 + 5. 逐题处理 ==========
        let segments = self.segmenter.segment(&digitized.full_text);
        for segment in &segments {
            *record.question_mut(segment.question_id) = self.question_flow.run(segment, &digitized, ctx);
        }

        info!(
            "{} ✓ 处理完成: {} | 总分 {}/{}",
            ctx,
            record.overall_status(),
            record.total_score(),
            self.exam.total_marks()
        );

        record
    }

    async fn identify(&self, document: &RasterizedDocument, ctx: &ScriptCtx) -> Identity {
        let first_page = match document.pages().next() {
            Some(Ok(page)) => page,
            Some(Err(e)) => {
                warn!("{} ⚠️ 首页无法解码，无法识别身份: {}", ctx, e);
                return Identity::missing();
            }
            None => return Identity::missing(),
        };

        match self
            .digitizer
            .digitize_header(&first_page, self.exam.policy.header_fraction)
            .await
        {
            Ok(output) => self.identity.extract(&output.text),
            Err(e) => {
                warn!("{} ⚠️ 页眉 OCR 失败: {}", ctx, e);
                Identity::missing()
            }
        }
    }
}
