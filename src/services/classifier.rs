//! 审核分类 - 业务能力层
//!
//! 自上而下一次性分类：先定每道题的状态，再由题目状态和身份状态推出整卷状态。
//! 纯函数，无副作用，重复计算结果相同。

use crate::models::script::{IdStatus, OcrStatus, OverallStatus};

/// 判定一道题状态所需的证据
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionEvidence {
    pub marker_found: bool,
    /// 切分出的答案是否有文本
    pub has_text: bool,
    /// 答案所在页的最低 OCR 置信度；None 表示 OCR 不可用
    pub confidence: Option<f64>,
}

/// 题目级分类器
#[derive(Debug, Clone, Copy)]
pub struct ReviewClassifier {
    confidence_threshold: f64,
}

impl ReviewClassifier {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// - 未找到标记、没有文本或 OCR 不可用 → MISSING
    /// - 置信度低于阈值 → LOW_CONFIDENCE
    /// - 其余 → OK
    pub fn classify_question(&self, evidence: &QuestionEvidence) -> OcrStatus {
        if !evidence.marker_found || !evidence.has_text {
            return OcrStatus::Missing;
        }
        match evidence.confidence {
            None => OcrStatus::Missing,
            Some(c) if c < self.confidence_threshold => OcrStatus::LowConfidence,
            Some(_) => OcrStatus::Ok,
        }
    }
}

/// 整卷状态
///
/// - 任一题 MISSING 或学号 MISSING → FULL_MANUAL
/// - 任一题 LOW_CONFIDENCE 或学号 AMBIGUOUS → PARTIAL_MANUAL
/// - 三题全部 OK 且学号 VALID → AUTO
pub fn classify_script(questions: &[OcrStatus; 3], id_status: IdStatus) -> OverallStatus {
    if id_status == IdStatus::Missing || questions.contains(&OcrStatus::Missing) {
        return OverallStatus::FullManual;
    }
    if id_status == IdStatus::Ambiguous || questions.contains(&OcrStatus::LowConfidence) {
        return OverallStatus::PartialManual;
    }
    OverallStatus::Auto
}
