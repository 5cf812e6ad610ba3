use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的答卷数量
    pub max_concurrent_scripts: usize,
    /// 单份答卷内同时识别的页数
    pub page_concurrency: usize,
    /// 待批改 PDF 所在目录
    pub scripts_folder: String,
    /// 考试配置 TOML，未设置时使用内置三题版式
    pub exam_config_path: Option<String>,
    /// 成绩报告（JSON）
    pub output_report_file: String,
    /// 人工复核清单
    pub review_list_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- OCR 服务配置 ---
    pub ocr_endpoint: String,
    pub ocr_api_key: Option<String>,
    /// HTTP 客户端整体超时（秒）
    pub ocr_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_scripts: 4,
            page_concurrency: 2,
            scripts_folder: "scripts".to_string(),
            exam_config_path: None,
            output_report_file: "grading_report.json".to_string(),
            review_list_file: "manual_review.txt".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            ocr_endpoint: "http://127.0.0.1:8866/ocr".to_string(),
            ocr_api_key: None,
            ocr_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_scripts: env_positive("MAX_CONCURRENT_SCRIPTS", default.max_concurrent_scripts),
            page_concurrency: env_positive("PAGE_CONCURRENCY", default.page_concurrency),
            scripts_folder: std::env::var("SCRIPTS_FOLDER").unwrap_or(default.scripts_folder),
            exam_config_path: std::env::var("EXAM_CONFIG_PATH").ok().filter(|p| !p.is_empty()),
            output_report_file: std::env::var("OUTPUT_REPORT_FILE").unwrap_or(default.output_report_file),
            review_list_file: std::env::var("REVIEW_LIST_FILE").unwrap_or(default.review_list_file),
            verbose_logging: env_or("VERBOSE_LOGGING", "bool", default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            ocr_endpoint: std::env::var("OCR_ENDPOINT").unwrap_or(default.ocr_endpoint),
            ocr_api_key: std::env::var("OCR_API_KEY").ok().filter(|k| !k.is_empty()),
            ocr_timeout_secs: env_or("OCR_TIMEOUT_SECS", "u64", default.ocr_timeout_secs),
        }
    }
}

/// 解析单个环境变量的值
fn parse_env_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: expected_type.to_string(),
    })
}

/// 读取环境变量；未设置时用默认值，无法解析时告警后用默认值
fn env_or<T: FromStr>(var_name: &str, expected_type: &str, default: T) -> T {
    match std::env::var(var_name) {
        Ok(value) => parse_env_value(var_name, &value, expected_type).unwrap_or_else(|e| {
            warn!("⚠️ {}，使用默认值", e);
            default
        }),
        Err(_) => default,
    }
}

fn env_positive(var_name: &str, default: usize) -> usize {
    match env_or(var_name, "正整数", default) {
        0 => {
            warn!("⚠️ 环境变量 {} 不能为 0，使用默认值 {}", var_name, default);
            default
        }
        n => n,
    }
}
