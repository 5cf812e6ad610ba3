//! 答案切分服务 - 业务能力层
//!
//! 在整份答卷的全文里独立查找每道题的标记文本（不区分大小写、取第一次出现），
//! 按找到的位置升序排列作为分界：某题的答案是从它的标记结束处到
//! 下一个被找到的标记开始处（或全文末尾）之间的文本。
//!
//! 分界只看位置，不看题号顺序：扫描顺序错乱时（例如 Q3 的标记出现在 Q2 之前）
//! 只要标记存在且不重复，仍然能切出正确的区间。

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::exam::{ExamConfig, QuestionId};
use crate::services::digitizer::PAGE_BREAK;

/// 一道题的切分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub question_id: QuestionId,
    /// 标记在全文中的位置；None 表示未找到
    pub marker_at: Option<Range<usize>>,
    /// 答案在全文中的区间
    pub span: Option<Range<usize>>,
    /// 去掉分页符并修剪空白后的答案文本
    pub raw_text: String,
}

impl Segment {
    pub fn marker_found(&self) -> bool {
        self.marker_at.is_some()
    }
}

/// 答案切分服务
pub struct AnswerSegmenter {
    markers: [(QuestionId, Regex); 3],
}

impl AnswerSegmenter {
    pub fn new(exam: &ExamConfig) -> AppResult<Self> {
        let build = |id: QuestionId| -> AppResult<(QuestionId, Regex)> {
            let pattern = marker_pattern(&exam.question(id).marker);
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| AppError::Config(ConfigError::InvalidPattern { pattern, source }))?;
            Ok((id, regex))
        };

        Ok(Self {
            markers: [build(QuestionId::Q1)?, build(QuestionId::Q2)?, build(QuestionId::Q3)?],
        })
    }

    /// 切出三道题的答案，按 Q1..Q3 顺序返回
    pub fn segment(&self, full_text: &str) -> [Segment; 3] {
        // 每个标记独立地在全文中找第一次出现
        let found: Vec<(QuestionId, Range<usize>)> = self
            .markers
            .iter()
            .filter_map(|(id, regex)| regex.find(full_text).map(|m| (*id, m.range())))
            .collect();

        // 位置相同的按题号排，保证结果确定
        let mut boundaries: Vec<(usize, QuestionId)> = found.iter().map(|(id, r)| (r.start, *id)).collect();
        boundaries.sort();

        QuestionId::ALL.map(|id| {
            let Some(marker_at) = found.iter().find(|(fid, _)| *fid == id).map(|(_, r)| r.clone()) else {
                return Segment {
                    question_id: id,
                    marker_at: None,
                    span: None,
                    raw_text: String::new(),
                };
            };

            let end = boundaries
                .iter()
                .map(|(start, _)| *start)
                .find(|start| *start > marker_at.start)
                .unwrap_or(full_text.len());
            // 相邻标记重叠时区间为空
            let start = marker_at.end.min(end);
            let span = start..end;

            Segment {
                question_id: id,
                raw_text: clean_span(&full_text[span.clone()]),
                marker_at: Some(marker_at),
                span: Some(span),
            }
        })
    }
}

/// 标记的各个单词之间允许任意空白（OCR 常在标记中间换行）
fn marker_pattern(marker: &str) -> String {
    marker
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn clean_span(text: &str) -> String {
    let page_break = PAGE_BREAK.trim();
    text.lines()
        .filter(|line| line.trim() != page_break)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
