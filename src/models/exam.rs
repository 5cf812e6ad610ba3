//! 考试配置
//!
//! 题号 → (标记文本, 满分) 的映射表，由外部注入而不是写死在流水线里

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 题号（固定三题）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestionId {
    Q1,
    Q2,
    Q3,
}

impl QuestionId {
    /// 按试卷顺序排列的全部题号
    pub const ALL: [QuestionId; 3] = [QuestionId::Q1, QuestionId::Q2, QuestionId::Q3];

    /// 在 `ALL` 中的下标
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionId::Q1 => "Q1",
            QuestionId::Q2 => "Q2",
            QuestionId::Q3 => "Q3",
        }
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 单题配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: QuestionId,
    /// 题目名称（仅用于展示）
    #[serde(default)]
    pub name: String,
    /// 用于在 OCR 文本中定位答案起点的标记文本
    pub marker: String,
    /// 满分
    pub max_marks: f64,
    /// 答案最少有效字符数，低于此值打上 `answer-too-short` 标记
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_min_length() -> usize {
    40
}

impl QuestionSpec {
    pub fn new(id: QuestionId, name: &str, marker: &str, max_marks: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            marker: marker.to_string(),
            max_marks,
            min_length: default_min_length(),
        }
    }
}

/// 评分策略选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringKind {
    /// 基于长度与字符密度的启发式评分
    #[default]
    LengthDensity,
    /// 不自动给分，全部留给人工
    ManualOnly,
}

/// 可调阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingPolicy {
    /// 低于该 OCR 置信度判为 LOW_CONFIDENCE
    pub confidence_threshold: f64,
    /// 空文本时的最大重试次数
    pub max_ocr_retries: u32,
    /// 单次 OCR 调用超时（秒）
    pub ocr_timeout_secs: u64,
    /// 首页顶部用于识别身份信息的比例
    pub header_fraction: f32,
    /// 学号匹配正则
    pub registration_pattern: String,
    pub scoring: ScoringKind,
    /// 得到满长度分所需的有效字符数
    pub target_length: usize,
    /// 乱码字符比例上限
    pub garbage_threshold: f64,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            max_ocr_retries: 2,
            ocr_timeout_secs: 120,
            header_fraction: 0.25,
            registration_pattern: r"\b[0-9]{6,10}\b".to_string(),
            scoring: ScoringKind::LengthDensity,
            target_length: 200,
            garbage_threshold: 0.3,
        }
    }
}

/// TOML 中的原始形态，加载后经 `validate` 转为 `ExamConfig`
#[derive(Debug, Clone, Deserialize)]
pub struct RawExamConfig {
    #[serde(default)]
    pub name: String,
    pub questions: Vec<QuestionSpec>,
    #[serde(default)]
    pub policy: GradingPolicy,
}

/// 已校验的考试配置：Q1、Q2、Q3 各恰好一项
#[derive(Debug, Clone, PartialEq)]
pub struct ExamConfig {
    pub name: String,
    questions: [QuestionSpec; 3],
    pub policy: GradingPolicy,
}

impl ExamConfig {
    pub fn new(name: impl Into<String>, questions: Vec<QuestionSpec>, policy: GradingPolicy) -> AppResult<Self> {
        RawExamConfig {
            name: name.into(),
            questions,
            policy,
        }
        .validate()
    }

    /// 按题号取配置
    pub fn question(&self, id: QuestionId) -> &QuestionSpec {
        &self.questions[id.index()]
    }

    /// 按 Q1..Q3 顺序遍历
    pub fn questions(&self) -> &[QuestionSpec; 3] {
        &self.questions
    }

    /// 全卷满分
    pub fn total_marks(&self) -> f64 {
        self.questions.iter().map(|q| q.max_marks).sum()
    }
}

impl RawExamConfig {
    pub fn validate(self) -> AppResult<ExamConfig> {
        let mut slots: [Option<QuestionSpec>; 3] = [None, None, None];

        for spec in self.questions {
            if spec.marker.trim().is_empty() {
                return Err(AppError::invalid_exam(format!("{} 的标记文本为空", spec.id)));
            }
            if !(spec.max_marks > 0.0) {
                return Err(AppError::invalid_exam(format!(
                    "{} 的满分必须为正数，当前为 {}",
                    spec.id, spec.max_marks
                )));
            }
            let slot = &mut slots[spec.id.index()];
            if slot.is_some() {
                return Err(AppError::invalid_exam(format!("{} 重复配置", spec.id)));
            }
            *slot = Some(spec);
        }

        let [q1, q2, q3] = slots;
        match (q1, q2, q3) {
            (Some(q1), Some(q2), Some(q3)) => {
                let policy = self.policy;
                if !(0.0..=1.0).contains(&policy.confidence_threshold) {
                    return Err(AppError::invalid_exam(format!(
                        "置信度阈值必须在 [0, 1] 内，当前为 {}",
                        policy.confidence_threshold
                    )));
                }
                if !(policy.header_fraction > 0.0 && policy.header_fraction <= 1.0) {
                    return Err(AppError::invalid_exam(format!(
                        "页眉比例必须在 (0, 1] 内，当前为 {}",
                        policy.header_fraction
                    )));
                }
                Ok(ExamConfig {
                    name: self.name,
                    questions: [q1, q2, q3],
                    policy,
                })
            }
            (q1, q2, q3) => {
                let missing: Vec<&str> = [q1.is_none(), q2.is_none(), q3.is_none()]
                    .iter()
                    .zip(QuestionId::ALL)
                    .filter(|(absent, _)| **absent)
                    .map(|(_, id)| id.as_str())
                    .collect();
                Err(AppError::invalid_exam(format!(
                    "缺少题目配置: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl Default for ExamConfig {
    /// 三题版式：图表概述 15 分、达卡公共交通 7 分、网购利弊 8 分
    fn default() -> Self {
        Self {
            name: "Writing Exam".to_string(),
            questions: [
                QuestionSpec::new(QuestionId::Q1, "Chart Summary", "Summarize the information", 15.0),
                QuestionSpec::new(
                    QuestionId::Q2,
                    "Public Transport in Dhaka",
                    "Public Transportation In Dhaka",
                    7.0,
                ),
                QuestionSpec::new(
                    QuestionId::Q3,
                    "Online Shopping A&D",
                    "An increasing number of people are buying",
                    8.0,
                ),
            ],
            policy: GradingPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exam_layout() {
        let exam = ExamConfig::default();
        assert_eq!(exam.question(QuestionId::Q1).max_marks, 15.0);
        assert_eq!(exam.question(QuestionId::Q2).max_marks, 7.0);
        assert_eq!(exam.question(QuestionId::Q3).max_marks, 8.0);
        assert_eq!(exam.total_marks(), 30.0);
        assert_eq!(exam.policy.confidence_threshold, 0.6);
        assert_eq!(exam.policy.max_ocr_retries, 2);
    }

    #[test]
    fn test_validate_reorders_by_question_id() {
        let exam = ExamConfig::new(
            "reordered",
            vec![
                QuestionSpec::new(QuestionId::Q3, "", "third", 3.0),
                QuestionSpec::new(QuestionId::Q1, "", "first", 1.0),
                QuestionSpec::new(QuestionId::Q2, "", "second", 2.0),
            ],
            GradingPolicy::default(),
        )
        .unwrap();

        let markers: Vec<&str> = exam.questions().iter().map(|q| q.marker.as_str()).collect();
        assert_eq!(markers, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_validate_rejects_missing_question() {
        let err = ExamConfig::new(
            "broken",
            vec![
                QuestionSpec::new(QuestionId::Q1, "", "first", 1.0),
                QuestionSpec::new(QuestionId::Q3, "", "third", 3.0),
            ],
            GradingPolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Q2"));
    }

    #[test]
    fn test_validate_rejects_duplicate_and_bad_marks() {
        let duplicate = ExamConfig::new(
            "dup",
            vec![
                QuestionSpec::new(QuestionId::Q1, "", "a", 1.0),
                QuestionSpec::new(QuestionId::Q1, "", "b", 1.0),
                QuestionSpec::new(QuestionId::Q2, "", "c", 1.0),
            ],
            GradingPolicy::default(),
        );
        assert!(duplicate.is_err());

        let zero_marks = ExamConfig::new(
            "zero",
            vec![
                QuestionSpec::new(QuestionId::Q1, "", "a", 0.0),
                QuestionSpec::new(QuestionId::Q2, "", "b", 1.0),
                QuestionSpec::new(QuestionId::Q3, "", "c", 1.0),
            ],
            GradingPolicy::default(),
        );
        assert!(zero_marks.is_err());
    }

    #[test]
    fn test_scoring_kind_kebab_case() {
        let kind: ScoringKind = serde_json::from_str("\"manual-only\"").unwrap();
        assert_eq!(kind, ScoringKind::ManualOnly);
    }
}
