//! 评分策略 - 业务能力层
//!
//! 接口固定为 `(raw_text, ocr_status, max_marks) → score`，具体算法可替换。
//! 任何实现都必须满足：
//! - 空文本返回 0
//! - 结果不超过 `max_marks`
//! - 对“答案实质内容”单调不减（内容更多、字符密度不更低时，分数不会更低）
//!
//! 调用方（`QuestionFlow`）仍会再做一次限幅，保证替换进来的实现出错时也不越界。

use phf::phf_set;

use crate::models::exam::{GradingPolicy, ScoringKind};
use crate::models::script::OcrStatus;

/// OCR 乱码中常见的字符
static GARBAGE_CHARS: phf::Set<char> = phf_set! {
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')',
    '[', ']', '{', '}', '|', '\\', '/', '<', '>', '~', '`',
};

/// 评分策略
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, raw_text: &str, ocr_status: OcrStatus, max_marks: f64) -> f64;
}

/// 按配置构建评分策略
pub fn build_strategy(policy: &GradingPolicy, min_length: usize) -> Box<dyn ScoringStrategy> {
    match policy.scoring {
        ScoringKind::LengthDensity => Box::new(LengthDensityScorer {
            min_length,
            target_length: policy.target_length.max(1),
            garbage_threshold: policy.garbage_threshold,
        }),
        ScoringKind::ManualOnly => Box::new(ManualOnlyScorer),
    }
}

/// 文本统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStats {
    /// 字母数字字符数
    pub substance: usize,
    /// 非空白字符数
    pub visible: usize,
    /// 乱码字符数
    pub garbage: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        let mut stats = TextStats {
            substance: 0,
            visible: 0,
            garbage: 0,
        };
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            stats.visible += 1;
            if c.is_alphanumeric() {
                stats.substance += 1;
            }
            if GARBAGE_CHARS.contains(&c) {
                stats.garbage += 1;
            }
        }
        stats
    }

    /// 乱码字符占可见字符的比例
    pub fn garbage_ratio(&self) -> f64 {
        if self.visible == 0 {
            0.0
        } else {
            self.garbage as f64 / self.visible as f64
        }
    }

    /// 字符密度：非乱码字符占比
    pub fn density(&self) -> f64 {
        1.0 - self.garbage_ratio()
    }
}

/// 长度 + 密度启发式
///
/// `max × base × density_factor`：
/// - 有效字符不足 `min_length` 时 base = 0.3
/// - 否则 base = 0.5 + 0.5 × min(有效字符 / target_length, 1)
/// - 乱码比例超过 `garbage_threshold` 时 density_factor = 0.6
#[derive(Debug, Clone)]
pub struct LengthDensityScorer {
    pub min_length: usize,
    pub target_length: usize,
    pub garbage_threshold: f64,
}

impl LengthDensityScorer {
    pub fn is_too_short(&self, stats: &TextStats) -> bool {
        stats.substance < self.min_length
    }

    pub fn is_suspect(&self, stats: &TextStats) -> bool {
        stats.garbage_ratio() > self.garbage_threshold
    }
}

impl ScoringStrategy for LengthDensityScorer {
    fn name(&self) -> &'static str {
        "length-density"
    }

    fn score(&self, raw_text: &str, ocr_status: OcrStatus, max_marks: f64) -> f64 {
        if ocr_status == OcrStatus::Missing {
            return 0.0;
        }
        let stats = TextStats::of(raw_text);
        if stats.substance == 0 {
            return 0.0;
        }

        let base = if self.is_too_short(&stats) {
            0.3
        } else {
            let length_ratio = (stats.substance as f64 / self.target_length as f64).min(1.0);
            0.5 + 0.5 * length_ratio
        };
        let density_factor = if self.is_suspect(&stats) { 0.6 } else { 1.0 };

        let score = max_marks * base * density_factor;
        ((score * 10.0).round() / 10.0).clamp(0.0, max_marks)
    }
}

/// 不自动评分，所有题目 0 分，等待人工
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualOnlyScorer;

impl ScoringStrategy for ManualOnlyScorer {
    fn name(&self) -> &'static str {
        "manual-only"
    }

    fn score(&self, _raw_text: &str, _ocr_status: OcrStatus, _max_marks: f64) -> f64 {
        0.0
    }
}
