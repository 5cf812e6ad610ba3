use anyhow::Result;
use exam_script_grader::utils::logging;
use exam_script_grader::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化应用
    let app = App::initialize(config).await?;

    // Ctrl-C 只停止调度新答卷，已开始的答卷会处理完
    let abort = app.abort_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到中断信号，停止调度新答卷");
            abort.abort();
        }
    });

    app.run().await?;

    Ok(())
}
