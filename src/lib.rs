//! # Exam Script Grader
//!
//! 扫描版英语作文答卷的批量预批改：PDF → 身份 → OCR → 切分 Q1/Q2/Q3 → 启发式评分
//! → 审核分类 → 成绩表与人工复核清单
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部资源边界，只暴露能力
//! - `RasterizedDocument` - PDF 解析与逐页解码
//! - `OcrEngine` - OCR 协作方接口，`HttpOcrEngine` 为默认实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单份答卷或单道题
//! - `IdentityExtractor` / `TextDigitizer` / `AnswerSegmenter`
//! - `ScoringStrategy` / `ReviewClassifier`
//! - `report::aggregate` / `ReportWriter`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `ScriptCtx` - 上下文封装（script_name + script_index）
//! - `QuestionFlow` - 流程编排（span → status → score → flags）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理并发、中止和报告
//! - `orchestrator/script_processor` - 单份答卷处理器
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{HttpOcrEngine, OcrEngine, OcrOutput, PreprocessHints};
pub use models::{ExamConfig, OverallStatus, ScriptRecord, ScriptUpload};
pub use orchestrator::{process_batch, AbortSignal, App, ScriptPipeline};
pub use services::GradingReport;
pub use workflow::{QuestionFlow, ScriptCtx};
