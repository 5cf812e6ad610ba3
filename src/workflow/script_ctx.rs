//! 答卷处理上下文
//!
//! 封装"我正在处理批次里的哪一份答卷"这一信息

use std::fmt::Display;

/// 答卷处理上下文
#[derive(Debug, Clone)]
pub struct ScriptCtx {
    /// 文件名
    pub script_name: String,

    /// 在批次中的序号（从 1 开始，仅用于日志显示）
    pub script_index: usize,
}

impl ScriptCtx {
    pub fn new(script_name: impl Into<String>, script_index: usize) -> Self {
        Self {
            script_name: script_name.into(),
            script_index,
        }
    }
}

impl Display for ScriptCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答卷 {}]", self.script_index)
    }
}
