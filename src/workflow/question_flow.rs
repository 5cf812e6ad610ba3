//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"从切分结果到最终得分的完整处理流程
//!
//! 流程顺序：
//! 1. 标记是否找到 → 未找到直接 MISSING
//! 2. 答案区间覆盖到的页 → 置信度、是否有失败页
//! 3. ReviewClassifier 定状态
//! 4. ScoringStrategy 打分（再限幅一次）
//! 5. 补充诊断标记

use tracing::{debug, info, warn};

use crate::models::exam::{ExamConfig, GradingPolicy, QuestionId};
use crate::models::script::{flags, OcrStatus, QuestionResult};
use crate::services::scoring::{build_strategy, ScoringStrategy, TextStats};
use crate::services::{DigitizedScript, QuestionEvidence, ReviewClassifier, Segment};
use crate::utils::logging::truncate_text;
use crate::workflow::script_ctx::ScriptCtx;

/// 题目处理流程
///
/// - 只处理单道题
/// - 不持有任何外部资源
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    classifier: ReviewClassifier,
    strategies: [Box<dyn ScoringStrategy>; 3],
    min_lengths: [usize; 3],
    max_marks: [f64; 3],
    garbage_threshold: f64,
    verbose_logging: bool,
}

impl QuestionFlow {
    pub fn new(exam: &ExamConfig, verbose_logging: bool) -> Self {
        let policy: &GradingPolicy = &exam.policy;
        let specs = exam.questions();

        Self {
            classifier: ReviewClassifier::new(policy.confidence_threshold),
            strategies: specs.each_ref().map(|spec| build_strategy(policy, spec.min_length)),
            min_lengths: specs.each_ref().map(|spec| spec.min_length),
            max_marks: specs.each_ref().map(|spec| spec.max_marks),
            garbage_threshold: policy.garbage_threshold,
            verbose_logging,
        }
    }

    pub fn run(&self, segment: &Segment, digitized: &DigitizedScript, ctx: &ScriptCtx) -> QuestionResult {
        let id = segment.question_id;
        let mut result = QuestionResult::missing(id, self.max_marks[id.index()]);

        // ========== 1. 标记 ==========
        let Some(span) = segment.span.as_ref() else {
            warn!("{} ⚠️ {} 未找到题目标记", ctx, id);
            result.flag(flags::MARKER_NOT_FOUND);
            return result;
        };

        // ========== 2. 页级证据 ==========
        // 跨过识别失败的页面时答案不完整，置信度按缺失处理
        let confidence = if digitized.touches_failed_page(span) {
            result.flag(flags::OCR_UNAVAILABLE);
            None
        } else {
            digitized.confidence_for(span)
        };

        let has_text = !segment.raw_text.trim().is_empty();
        if !has_text {
            result.flag(flags::EMPTY_ANSWER);
        }

        // ========== 3. 状态 ==========
        result.ocr_status = self.classifier.classify_question(&QuestionEvidence {
            marker_found: true,
            has_text,
            confidence,
        });
        if result.ocr_status == OcrStatus::LowConfidence {
            result.flag(flags::LOW_CONFIDENCE_OCR);
        }
        result.raw_text = segment.raw_text.clone();

        // ========== 4. 评分 ==========
        let strategy = &self.strategies[id.index()];
        let score = strategy.score(&result.raw_text, result.ocr_status, result.max_marks());
        result.set_ai_score(score);

        // ========== 5. 诊断标记 ==========
        if has_text {
            self.flag_quality(id, &mut result);
        }

        info!(
            "{} {}: {:?}, 得分 {}/{} ({})",
            ctx,
            id,
            result.ocr_status,
            result.final_score(),
            result.max_marks(),
            strategy.name()
        );
        if self.verbose_logging {
            debug!("{} {} 答案: {}", ctx, id, truncate_text(&result.raw_text, 80));
        }

        result
    }

    fn flag_quality(&self, id: QuestionId, result: &mut QuestionResult) {
        let stats = TextStats::of(&result.raw_text);
        if stats.substance < self.min_lengths[id.index()] {
            result.flag(flags::ANSWER_TOO_SHORT);
        }
        if stats.garbage_ratio() > self.garbage_threshold {
            result.flag(flags::SUSPECT_OCR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::OcrOutput;
    use crate::services::AnswerSegmenter;

    fn flow() -> QuestionFlow {
        QuestionFlow::new(&ExamConfig::default(), false)
    }

    fn ctx() -> ScriptCtx {
        ScriptCtx::new("test.pdf", 1)
    }

    fn run_all(pages: Vec<(usize, Option<OcrOutput>)>) -> Vec<QuestionResult> {
        let digitized = DigitizedScript::from_pages(pages);
        let segments = AnswerSegmenter::new(&ExamConfig::default())
            .unwrap()
            .segment(&digitized.full_text);
        segments.iter().map(|s| flow().run(s, &digitized, &ctx())).collect()
    }

    fn long_answer() -> String {
        vec!["the chart shows growth"; 12].join(" ")
    }

    #[test]
    fn test_all_markers_high_confidence() {
        let text = format!(
            "Summarize the information {} Public Transportation In Dhaka {} \
             An increasing number of people are buying {}",
            long_answer(),
            long_answer(),
            long_answer()
        );
        let results = run_all(vec![(1, Some(OcrOutput::new(text, 0.92)))]);

        assert!(results.iter().all(|r| r.ocr_status == OcrStatus::Ok));
        assert!(results.iter().all(|r| r.flags.is_empty()));
        assert!(results.iter().all(|r| r.final_score() > 0.0 && r.final_score() <= r.max_marks()));
    }

    #[test]
    fn test_missing_marker() {
        let text = format!("Summarize the information {}", long_answer());
        let results = run_all(vec![(1, Some(OcrOutput::new(text, 0.9)))]);

        assert_eq!(results[1].ocr_status, OcrStatus::Missing);
        assert!(results[1].has_flag(flags::MARKER_NOT_FOUND));
        assert_eq!(results[1].final_score(), 0.0);
        assert_eq!(results[1].raw_text, "");
    }

    #[test]
    fn test_low_confidence_page() {
        let text = format!(
            "Summarize the information {} Public Transportation In Dhaka {} \
             An increasing number of people are buying {}",
            long_answer(),
            long_answer(),
            long_answer()
        );
        let results = run_all(vec![(1, Some(OcrOutput::new(text, 0.4)))]);

        assert!(results.iter().all(|r| r.ocr_status == OcrStatus::LowConfidence));
        assert!(results[0].has_flag(flags::LOW_CONFIDENCE_OCR));
        // 低置信度仍然给分
        assert!(results[0].final_score() > 0.0);
    }

    #[test]
    fn test_confidence_is_taken_per_span() {
        let results = run_all(vec![
            (1, Some(OcrOutput::new(format!("Summarize the information {}", long_answer()), 0.95))),
            (
                2,
                Some(OcrOutput::new(
                    format!(
                        "continued. Public Transportation In Dhaka {} An increasing number of people are buying {}",
                        long_answer(),
                        long_answer()
                    ),
                    0.3,
                )),
            ),
        ]);

        // Q1 的区间延伸到第 2 页开头，取两页中较低的置信度
        assert_eq!(results[0].ocr_status, OcrStatus::LowConfidence);
        assert_eq!(results[1].ocr_status, OcrStatus::LowConfidence);
        assert_eq!(results[2].ocr_status, OcrStatus::LowConfidence);
    }

    #[test]
    fn test_empty_answer_is_missing() {
        let text = format!(
            "Summarize the information Public Transportation In Dhaka {} \
             An increasing number of people are buying {}",
            long_answer(),
            long_answer()
        );
        let results = run_all(vec![(1, Some(OcrOutput::new(text, 0.9)))]);

        assert_eq!(results[0].ocr_status, OcrStatus::Missing);
        assert!(results[0].has_flag(flags::EMPTY_ANSWER));
        assert!(!results[0].has_flag(flags::MARKER_NOT_FOUND));
        assert_eq!(results[0].final_score(), 0.0);
    }

    #[test]
    fn test_quality_flags_do_not_change_status() {
        let text = "Summarize the information short \
                    Public Transportation In Dhaka ##@@!!<<>> ok \
                    An increasing number of people are buying fine";
        let results = run_all(vec![(1, Some(OcrOutput::new(text, 0.9)))]);

        assert_eq!(results[0].ocr_status, OcrStatus::Ok);
        assert!(results[0].has_flag(flags::ANSWER_TOO_SHORT));
        assert!(results[1].has_flag(flags::SUSPECT_OCR));
        assert_eq!(results[1].ocr_status, OcrStatus::Ok);
    }

    #[test]
    fn test_failed_page_in_span_is_flagged() {
        let results = run_all(vec![
            (
                1,
                Some(OcrOutput::new(
                    format!(
                        "Summarize the information {} Public Transportation In Dhaka {}",
                        long_answer(),
                        long_answer()
                    ),
                    0.9,
                )),
            ),
            (2, None),
            (3, Some(OcrOutput::new(format!("An increasing number of people are buying {}", long_answer()), 0.9))),
        ]);

        assert!(results[1].has_flag(flags::OCR_UNAVAILABLE));
        assert_eq!(results[1].ocr_status, OcrStatus::Missing);
        assert_eq!(results[1].ai_score(), 0.0);
        assert!(!results[2].has_flag(flags::OCR_UNAVAILABLE));
        assert_eq!(results[2].ocr_status, OcrStatus::Ok);
        assert_eq!(results[0].ocr_status, OcrStatus::Ok);
    }
}
