//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量答卷处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载答卷（Vec<ScriptUpload>）
//! - 控制并发数量（Semaphore）与中止（AbortSignal）
//! - 汇总报告并输出全局统计
//!
//! ### `script_processor` - 单份答卷处理器
//! - 栅格化 → 身份 → 识别 → 切分
//! - 复用同一个 QuestionFlow 处理三道题
//! - 出错时降级为完整的 FULL_MANUAL 记录
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ScriptUpload>)
//!     ↓
//! script_processor (处理一份 PDF)
//!     ↓
//! workflow::QuestionFlow (处理单道题)
//!     ↓
//! services (能力层：identity / digitizer / segmenter / scoring / classifier)
//!     ↓
//! infrastructure (基础设施：RasterizedDocument / OcrEngine)
//! ```

pub mod batch_processor;
pub mod script_processor;

// 重新导出主要类型
pub use batch_processor::{process_batch, AbortSignal, App};
pub use script_processor::ScriptPipeline;
