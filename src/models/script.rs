//! 答卷记录
//!
//! 一份 PDF 对应一个 `ScriptRecord`，固定包含三道题的 `QuestionResult`

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::exam::{ExamConfig, QuestionId};
use crate::services::classifier;

/// 诊断标记
pub mod flags {
    pub const MARKER_NOT_FOUND: &str = "marker-not-found";
    pub const LOW_CONFIDENCE_OCR: &str = "low-confidence-ocr";
    pub const EMPTY_ANSWER: &str = "empty-answer";
    pub const OCR_UNAVAILABLE: &str = "ocr-unavailable";
    pub const ANSWER_TOO_SHORT: &str = "answer-too-short";
    pub const SUSPECT_OCR: &str = "suspect-ocr";
    pub const CORRUPT_DOCUMENT: &str = "corrupt-document";
    pub const EMPTY_DOCUMENT: &str = "empty-document";
    pub const NOT_PROCESSED: &str = "not-processed";
    pub const PIPELINE_PANICKED: &str = "pipeline-panicked";
    pub const ID_MISSING: &str = "id-missing";
    pub const ID_AMBIGUOUS: &str = "id-ambiguous";
}

/// 学号识别状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdStatus {
    Valid,
    Missing,
    /// 页眉里出现了多个不同的学号候选
    Ambiguous,
}

/// 单题 OCR 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OcrStatus {
    Ok,
    LowConfidence,
    Missing,
}

/// 整份答卷的审核状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Auto,
    PartialManual,
    FullManual,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OverallStatus::Auto => "AUTO",
            OverallStatus::PartialManual => "PARTIAL_MANUAL",
            OverallStatus::FullManual => "FULL_MANUAL",
        };
        write!(f, "{}", s)
    }
}

/// 单题结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    max_marks: f64,
    pub raw_text: String,
    pub ocr_status: OcrStatus,
    ai_score: f64,
    final_score: f64,
    pub flags: BTreeSet<String>,
}

impl QuestionResult {
    /// 未提取到任何内容的题目：MISSING，0 分
    pub fn missing(question_id: QuestionId, max_marks: f64) -> Self {
        Self {
            question_id,
            max_marks,
            raw_text: String::new(),
            ocr_status: OcrStatus::Missing,
            ai_score: 0.0,
            final_score: 0.0,
            flags: BTreeSet::new(),
        }
    }

    pub fn max_marks(&self) -> f64 {
        self.max_marks
    }

    pub fn ai_score(&self) -> f64 {
        self.ai_score
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    /// 写入启发式得分，`final_score` 随之同步；始终限制在 `[0, max_marks]`
    pub fn set_ai_score(&mut self, score: f64) {
        let clamped = clamp_score(score, self.max_marks);
        self.ai_score = clamped;
        self.final_score = clamped;
    }

    pub fn flag(&mut self, tag: &str) {
        self.flags.insert(tag.to_string());
    }

    pub fn has_flag(&self, tag: &str) -> bool {
        self.flags.contains(tag)
    }
}

/// NaN 视为 0
pub fn clamp_score(score: f64, max_marks: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, max_marks.max(0.0))
}

/// 答卷记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptRecord {
    pub script_name: String,
    pub student_name: String,
    pub registration_number: String,
    pub id_status: IdStatus,
    /// 按 Q1、Q2、Q3 顺序，数量由类型保证
    pub questions: [QuestionResult; 3],
    /// 整卷级诊断标记（身份、文档损坏等）
    pub script_flags: BTreeSet<String>,
}

impl ScriptRecord {
    /// 处理开始时的空记录：三题均为 MISSING
    pub fn empty(script_name: impl Into<String>, exam: &ExamConfig) -> Self {
        Self {
            script_name: script_name.into(),
            student_name: String::new(),
            registration_number: String::new(),
            id_status: IdStatus::Missing,
            questions: QuestionId::ALL.map(|id| QuestionResult::missing(id, exam.question(id).max_marks)),
            script_flags: BTreeSet::new(),
        }
    }

    /// 完全无法处理的答卷，带上原因标记
    pub fn degraded(script_name: impl Into<String>, exam: &ExamConfig, reason: &str) -> Self {
        let mut record = Self::empty(script_name, exam);
        record.flag(reason);
        record
    }

    pub fn question(&self, id: QuestionId) -> &QuestionResult {
        &self.questions[id.index()]
    }

    pub fn question_mut(&mut self, id: QuestionId) -> &mut QuestionResult {
        &mut self.questions[id.index()]
    }

    pub fn flag(&mut self, tag: &str) {
        self.script_flags.insert(tag.to_string());
    }

    /// 各题 `final_score` 之和，每次重新计算
    pub fn total_score(&self) -> f64 {
        let total: f64 = self.questions.iter().map(|q| q.final_score()).sum();
        (total * 10.0).round() / 10.0
    }

    /// 由各题状态和身份状态推导，不存储
    pub fn overall_status(&self) -> OverallStatus {
        classifier::classify_script(&self.question_statuses(), self.id_status)
    }

    pub fn question_statuses(&self) -> [OcrStatus; 3] {
        [
            self.questions[0].ocr_status,
            self.questions[1].ocr_status,
            self.questions[2].ocr_status,
        ]
    }

    /// 整卷标记与所有题目标记的并集
    pub fn all_flags(&self) -> BTreeSet<String> {
        let mut all = self.script_flags.clone();
        for question in &self.questions {
            all.extend(question.flags.iter().cloned());
        }
        all
    }
}
