//! 流程层（Workflow）
//!
//! 定义"一道题"的处理流程，以及处理时携带的答卷上下文

pub mod question_flow;
pub mod script_ctx;

pub use question_flow::QuestionFlow;
pub use script_ctx::ScriptCtx;
