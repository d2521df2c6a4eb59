use anyhow::Result;
use envi_batch_runner::config::Config;
use envi_batch_runner::models::BatchParams;
use envi_batch_runner::orchestrator::BatchRunner;
use envi_batch_runner::services::discover_samples;
use envi_batch_runner::utils::logging;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 初始化日志
    logging::init();

    // 加载配置：可选的 TOML 文件 + 环境变量
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::from_toml_file(&PathBuf::from(path))?.apply_env()?,
        None => Config::from_env()?,
    };

    if config.list_only {
        let ids = discover_samples(&config.workspace).await?;
        info!("✓ 找到 {} 个样本", ids.len());
        for id in ids {
            println!("sample_{}", id);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let params = BatchParams::from_config(&config)?;
    logging::log_startup(&params);
    let mut log_file = logging::init_log_file(&config.output_log_file)?;

    let started = Instant::now();
    let runner = BatchRunner::new();
    let (mut logs, task) = runner.start(params)?;

    // 前端：按入队顺序取日志，输出到终端并追加到日志文件
    let log_file_error = logging::drain_logs(&mut logs, &mut log_file).await;

    let outcome = task.wait().await;
    logging::print_final_stats(&outcome, started.elapsed(), &config.output_log_file);
    if let Some(e) = log_file_error {
        error!("日志文件不完整 ({}): {}", config.output_log_file, e);
    }

    if let Some(e) = outcome.error() {
        error!("Simulation Error: {}", e);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
