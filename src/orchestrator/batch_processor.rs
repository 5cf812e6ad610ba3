//! 批量答卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批答卷的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、考试配置、OCR 引擎、共享流水线
//! 2. **批量加载**：扫描并加载所有待批改的 PDF（`Vec<ScriptUpload>`）
//! 3. **并发控制**：使用 Semaphore 限制同时处理的答卷数
//! 4. **中止**：`AbortSignal` 触发后不再调度新答卷，已开始的答卷照常完成
//! 5. **汇总输出**：生成报告、写出文件、打印统计
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单份答卷的细节，委托 `ScriptPipeline`
//! - **顺序稳定**：结果按上传顺序排列，与完成先后无关
//! - **永不丢卷**：任务崩溃或未被调度的答卷也有一行 FULL_MANUAL 记录

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{HttpOcrEngine, OcrEngine};
use crate::models::script::{flags, ScriptRecord};
use crate::models::{load_exam_config, load_script_uploads, ScriptUpload};
use crate::orchestrator::script_processor::ScriptPipeline;
use crate::services::{aggregate, GradingReport, ReportWriter};
use crate::utils::logging::{init_log_file, log_scripts_loaded, log_startup, print_final_stats};
use crate::workflow::ScriptCtx;

/// 批次中止信号，可在任意线程触发
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: Arc<ScriptPipeline>,
    abort: AbortSignal,
}

impl App {
    /// 初始化应用，OCR 引擎使用 HTTP 服务
    pub async fn initialize(config: Config) -> Result<Self> {
        let engine = HttpOcrEngine::new(
            config.ocr_endpoint.clone(),
            config.ocr_api_key.clone(),
            Duration::from_secs(config.ocr_timeout_secs),
        )
        .context("无法创建 OCR 客户端")?;

        Self::with_engine(config, Arc::new(engine)).await
    }

    /// 使用指定的 OCR 引擎初始化
    pub async fn with_engine(config: Config, engine: Arc<dyn OcrEngine>) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        let exam = load_exam_config(config.exam_config_path.as_deref().map(Path::new)).await?;
        log_startup(config.max_concurrent_scripts, &exam.name);

        let pipeline = ScriptPipeline::new(exam, engine, config.page_concurrency, config.verbose_logging)
            .context("无法构建批改流水线")?;

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            abort: AbortSignal::new(),
        })
    }

    /// 供外部（如 Ctrl-C 处理）触发中止
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<GradingReport> {
        // 加载所有待批改的答卷
        let uploads = self.load_scripts().await?;

        if uploads.is_empty() {
            warn!("⚠️ 没有找到待批改的 PDF，程序结束");
            return Ok(aggregate(&[]));
        }

        log_scripts_loaded(uploads.len(), self.config.max_concurrent_scripts);

        let records = process_batch(
            uploads,
            self.pipeline.clone(),
            self.config.max_concurrent_scripts,
            &self.abort,
        )
        .await;

        let report = aggregate(&records);
        ReportWriter::with_paths(&self.config.output_report_file, &self.config.review_list_file)
            .write(&report)
            .context("写出报告失败")?;
        info!(
            "📝 报告已写入 {}，待复核清单 {}",
            self.config.output_report_file, self.config.review_list_file
        );

        // 输出最终统计
        print_final_stats(&report.summary, &self.config.output_log_file);

        Ok(report)
    }

    /// 加载答卷
    async fn load_scripts(&self) -> Result<Vec<ScriptUpload>> {
        info!("\n📁 正在扫描待批改的答卷...");
        load_script_uploads(&self.config.scripts_folder).await
    }
}

/// 并发处理一批答卷，结果与 `uploads` 一一对应、顺序一致
pub async fn process_batch(
    uploads: Vec<ScriptUpload>,
    pipeline: Arc<ScriptPipeline>,
    max_concurrent: usize,
    abort: &AbortSignal,
) -> Vec<ScriptRecord> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let total = uploads.len();
    let mut handles = Vec::with_capacity(total);
    let mut pending = uploads.into_iter().enumerate();

    // ========== 调度 ==========
    for (idx, upload) in pending.by_ref() {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) if !abort.is_aborted() => permit,
            _ => {
                warn!("⚠️ 批次已中止，剩余 {} 份答卷不再处理", total - idx);
                // 当前这份也没有被调度
                handles.push((upload.script_name, None));
                break;
            }
        };

        let ctx = ScriptCtx::new(&upload.script_name, idx + 1);
        let pipeline = pipeline.clone();
        let script_name = upload.script_name.clone();

        let handle = tokio::spawn(async move {
            let _permit = permit;
            pipeline.process(&upload, &ctx).await
        });
        handles.push((script_name, Some(handle)));
    }

    // ========== 按上传顺序收集 ==========
    let exam = pipeline.exam();
    let mut records = Vec::with_capacity(total);

    for (idx, (script_name, handle)) in handles.into_iter().enumerate() {
        let record = match handle {
            Some(handle) => match handle.await {
                Ok(record) => record,
                Err(e) => {
                    error!("[答卷 {}] 任务执行失败: {}", idx + 1, e);
                    ScriptRecord::degraded(script_name, exam, flags::PIPELINE_PANICKED)
                }
            },
            None => ScriptRecord::degraded(script_name, exam, flags::NOT_PROCESSED),
        };
        records.push(record);
    }

    for (_, upload) in pending {
        records.push(ScriptRecord::degraded(upload.script_name, exam, flags::NOT_PROCESSED));
    }

    records
}
