//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，只处理单份答卷或单道题，不关心流程顺序。

pub mod classifier;
pub mod digitizer;
pub mod identity;
pub mod report;
pub mod report_writer;
pub mod scoring;
pub mod segmenter;

pub use classifier::{classify_script, QuestionEvidence, ReviewClassifier};
pub use digitizer::{DigitizedScript, PageSpan, TextDigitizer, PAGE_BREAK};
pub use identity::{Identity, IdentityExtractor};
pub use report::{aggregate, GradingReport, MarksheetRow, ReportSummary, ReviewRow};
pub use report_writer::ReportWriter;
pub use scoring::{build_strategy, LengthDensityScorer, ManualOnlyScorer, ScoringStrategy, TextStats};
pub use segmenter::{AnswerSegmenter, Segment};
