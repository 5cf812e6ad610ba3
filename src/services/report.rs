//! 报告汇总 - 业务能力层
//!
//! 把一批 `ScriptRecord` 折叠成两张表：全部答卷的成绩表和需要人工复核的清单。
//! 纯函数，不做 I/O，两张表都保持输入批次顺序。

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::exam::QuestionId;
use crate::models::script::{IdStatus, OcrStatus, OverallStatus, ScriptRecord};

/// 成绩表中的单题列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionColumns {
    pub question_id: QuestionId,
    pub final_score: f64,
    pub ai_score: f64,
    pub max_marks: f64,
    pub ocr_status: OcrStatus,
    pub flags: Vec<String>,
}

/// 成绩表的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarksheetRow {
    pub script_name: String,
    pub student_name: String,
    pub registration_number: String,
    pub id_status: IdStatus,
    pub overall_status: OverallStatus,
    pub questions: Vec<QuestionColumns>,
    pub total_score: f64,
}

/// 人工复核清单的一行（ReviewItem）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub script_name: String,
    /// "姓名 (学号)"，缺失部分写作 UNKNOWN
    pub student: String,
    pub status: OverallStatus,
    /// 整卷标记与所有题目标记的并集
    pub flags: BTreeSet<String>,
    /// 可读的问题说明
    pub issues: Vec<String>,
}

/// 按状态统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub auto: usize,
    pub partial_manual: usize,
    pub full_manual: usize,
}

/// 交给报告写出方的完整模型
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingReport {
    pub marksheet: Vec<MarksheetRow>,
    pub review: Vec<ReviewRow>,
    pub summary: ReportSummary,
}

/// 汇总一批答卷
pub fn aggregate(records: &[ScriptRecord]) -> GradingReport {
    let mut summary = ReportSummary {
        total: records.len(),
        ..Default::default()
    };

    let mut marksheet = Vec::with_capacity(records.len());
    let mut review = Vec::new();

    for record in records {
        let status = record.overall_status();
        match status {
            OverallStatus::Auto => summary.auto += 1,
            OverallStatus::PartialManual => summary.partial_manual += 1,
            OverallStatus::FullManual => summary.full_manual += 1,
        }

        marksheet.push(marksheet_row(record, status));
        if status != OverallStatus::Auto {
            review.push(review_row(record, status));
        }
    }

    GradingReport {
        marksheet,
        review,
        summary,
    }
}

fn marksheet_row(record: &ScriptRecord, overall_status: OverallStatus) -> MarksheetRow {
    MarksheetRow {
        script_name: record.script_name.clone(),
        student_name: record.student_name.clone(),
        registration_number: record.registration_number.clone(),
        id_status: record.id_status,
        overall_status,
        questions: record
            .questions
            .iter()
            .map(|q| QuestionColumns {
                question_id: q.question_id,
                final_score: q.final_score(),
                ai_score: q.ai_score(),
                max_marks: q.max_marks(),
                ocr_status: q.ocr_status,
                flags: q.flags.iter().cloned().collect(),
            })
            .collect(),
        total_score: record.total_score(),
    }
}

fn review_row(record: &ScriptRecord, status: OverallStatus) -> ReviewRow {
    ReviewRow {
        script_name: record.script_name.clone(),
        student: student_label(record),
        status,
        flags: record.all_flags(),
        issues: issues(record),
    }
}

fn student_label(record: &ScriptRecord) -> String {
    let or_unknown = |s: &str| {
        if s.trim().is_empty() {
            "UNKNOWN".to_string()
        } else {
            s.to_string()
        }
    };
    format!(
        "{} ({})",
        or_unknown(&record.student_name),
        or_unknown(&record.registration_number)
    )
}

fn issues(record: &ScriptRecord) -> Vec<String> {
    let mut issues = Vec::new();

    match record.id_status {
        IdStatus::Missing => issues.push("Unreadable ID".to_string()),
        IdStatus::Ambiguous => issues.push("Ambiguous ID".to_string()),
        IdStatus::Valid => {}
    }

    for question in &record.questions {
        match question.ocr_status {
            OcrStatus::Missing => issues.push(format!("{}: Missing", question.question_id)),
            OcrStatus::LowConfidence => issues.push(format!("{}: Low confidence", question.question_id)),
            OcrStatus::Ok => {}
        }
    }

    if record.total_score() == 0.0 {
        issues.push("Blank final score".to_string());
    }

    issues
}
