//! 报告写入服务 - 业务能力层
//!
//! 只负责把 `GradingReport` 落盘，不关心流程

use std::fs;

use tracing::debug;

use crate::error::{AppError, AppResult, FileError};
use crate::services::report::{GradingReport, ReviewRow};

/// 报告写入服务
///
/// 职责：
/// - 成绩表写成格式化 JSON（整体覆盖）
/// - 人工复核清单每行一份答卷（整体覆盖）
pub struct ReportWriter {
    report_file_path: String,
    review_file_path: String,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            report_file_path: "grading_report.json".to_string(),
            review_file_path: "manual_review.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_paths(report_file_path: impl Into<String>, review_file_path: impl Into<String>) -> Self {
        Self {
            report_file_path: report_file_path.into(),
            review_file_path: review_file_path.into(),
        }
    }

    /// 写出整份报告
    pub fn write(&self, report: &GradingReport) -> AppResult<()> {
        debug!(
            "写入报告: {} 行成绩, {} 行待复核",
            report.marksheet.len(),
            report.review.len()
        );

        let json = serde_json::to_string_pretty(report).map_err(|source| {
            AppError::File(FileError::SerializeFailed {
                path: self.report_file_path.clone(),
                source,
            })
        })?;
        fs::write(&self.report_file_path, json)
            .map_err(|e| AppError::file_write_failed(&self.report_file_path, e))?;

        // 两份文件描述同一批次，复核清单不保留上一轮的内容
        let review: String = report.review.iter().map(review_line).collect();
        fs::write(&self.review_file_path, review)
            .map_err(|e| AppError::file_write_failed(&self.review_file_path, e))?;

        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn review_line(row: &ReviewRow) -> String {
    let flags: Vec<&str> = row.flags.iter().map(String::as_str).collect();
    format!(
        "{} | {} | {} | {} | {}\n",
        row.script_name,
        row.student,
        row.status,
        row.issues.join("; "),
        flags.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::ExamConfig;
    use crate::models::script::{flags, ScriptRecord};
    use crate::services::report::aggregate;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("report_writer_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_review_line_format() {
        let record = ScriptRecord::degraded("x.pdf", &ExamConfig::default(), flags::CORRUPT_DOCUMENT);
        let report = aggregate(&[record]);
        let line = review_line(&report.review[0]);
        assert!(line.starts_with("x.pdf | UNKNOWN (UNKNOWN) | FULL_MANUAL | Unreadable ID; Q1: Missing"));
        assert!(line.trim_end().ends_with("corrupt-document"));
    }

    #[test]
    fn test_write_report_and_review_list() {
        let dir = temp_dir("write");
        let report_path = dir.join("report.json");
        let review_path = dir.join("review.txt");
        let writer = ReportWriter::with_paths(
            report_path.to_string_lossy().to_string(),
            review_path.to_string_lossy().to_string(),
        );

        let exam = ExamConfig::default();
        let report = aggregate(&[
            ScriptRecord::degraded("a.pdf", &exam, flags::CORRUPT_DOCUMENT),
            ScriptRecord::degraded("b.pdf", &exam, flags::EMPTY_DOCUMENT),
        ]);
        writer.write(&report).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["marksheet"][0]["overall_status"], "FULL_MANUAL");
        assert_eq!(json["marksheet"][1]["questions"][2]["question_id"], "Q3");

        let review = fs::read_to_string(&review_path).unwrap();
        assert_eq!(review.lines().count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_second_run_replaces_review_list() {
        let dir = temp_dir("rerun");
        let review_path = dir.join("review.txt");
        let writer = ReportWriter::with_paths(
            dir.join("report.json").to_string_lossy().to_string(),
            review_path.to_string_lossy().to_string(),
        );
        let exam = ExamConfig::default();

        let first = aggregate(&[
            ScriptRecord::degraded("old_a.pdf", &exam, flags::CORRUPT_DOCUMENT),
            ScriptRecord::degraded("old_b.pdf", &exam, flags::CORRUPT_DOCUMENT),
        ]);
        writer.write(&first).unwrap();

        let second = aggregate(&[ScriptRecord::degraded("new.pdf", &exam, flags::EMPTY_DOCUMENT)]);
        writer.write(&second).unwrap();

        let review = fs::read_to_string(&review_path).unwrap();
        assert_eq!(review.lines().count(), second.review.len());
        assert!(review.starts_with("new.pdf | "));
        assert!(!review.contains("old_a.pdf"));

        // 本轮没有待复核答卷时清单为空
        writer.write(&aggregate(&[])).unwrap();
        assert!(fs::read_to_string(&review_path).unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
