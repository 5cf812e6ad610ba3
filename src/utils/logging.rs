//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::services::report::ReportSummary;

/// 初始化 tracing 订阅者
///
/// 日志级别取自 `RUST_LOG`，未设置时为 `info`；重复调用无副作用
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答卷批改日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发答卷数
/// - `exam_name`: 考试名称
pub fn log_startup(max_concurrent: usize, exam_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发答卷批改模式");
    info!("📝 考试: {}", exam_name);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录答卷加载信息
pub fn log_scripts_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 份待批改的答卷", total);
    info!("📋 最多同时处理 {} 份\n", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 按审核状态的统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &ReportSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 自动批改: {}/{}", summary.auto, summary.total);
    info!("🔍 部分人工: {}", summary.partial_manual);
    info!("❌ 全部人工: {}", summary.full_manual);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max_len {
        flat.chars().take(max_len).collect::<String>() + "..."
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_text("line one\nline two", 100), "line one line two");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let path = std::env::temp_dir().join(format!("grader_log_{}.txt", std::process::id()));
        init_log_file(&path.to_string_lossy()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("答卷批改日志"));
        let _ = fs::remove_file(&path);
    }
}
