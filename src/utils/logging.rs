use crate::models::{BatchParams, RunOutcome};
use anyhow::{Context, Result};
/// 日志工具模块
///
/// 诊断日志走 tracing；批处理日志另写一份到日志文件
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化 tracing，默认 info 级别，可用 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件，写入表头并返回追加句柄
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<File> {
    let log_header = format!(
        "{}\nENVI-met 批处理日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    OpenOptions::new()
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))
}

/// 追加一行到日志文件
pub fn append_line(file: &mut impl Write, line: &str) -> Result<()> {
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 取完日志通道：每行输出到终端并追加到日志文件
///
/// 日志文件写失败不打断批处理，之后只输出到终端，返回第一个错误。
pub async fn drain_logs(
    logs: &mut UnboundedReceiver<String>,
    log_file: &mut impl Write,
) -> Option<anyhow::Error> {
    let mut log_file_error = None;
    while let Some(line) = logs.recv().await {
        println!("{}", line);
        if log_file_error.is_none() {
            if let Err(e) = append_line(&mut *log_file, &line) {
                warn!("⚠️ 日志文件写入失败，后续只输出到终端: {}", e);
                log_file_error = Some(e);
            }
        }
    }
    log_file_error
}

/// 记录程序启动信息
pub fn log_startup(params: &BatchParams) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - ENVI-met 批处理");
    info!("📁 工作区: {}", params.workspace.display());
    info!("📂 输出目录: {}", params.output_dir.display());
    info!("⚙️ core: {}", params.core_exe.display());
    info!("⏱️ 模拟时长: {} 小时", params.duration_hours);
    info!("🎯 样本选择: {}", params.selection);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `outcome`: 批处理终态
/// - `elapsed`: 总耗时
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(outcome: &RunOutcome, elapsed: Duration, log_file_path: &str) {
    info!("{}", "=".repeat(60));
    info!("📊 批处理统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("耗时: {}", format_elapsed(elapsed));
    info!("{}", "=".repeat(60));
    info!("✅ 成功样本: {}", outcome.runs().len());
    match outcome.failed_sample() {
        Some(id) => info!("❌ 失败样本: {}", id),
        None if outcome.is_completed() => info!("🎉 全部完成"),
        None => info!("❌ 批处理未能开始或中途中止"),
    }
    info!("{}", "=".repeat(60));
    info!("日志已保存至: {}", log_file_path);
}

/// 耗时格式化为 `HH:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 7 * 60 + 9)), "03:07:09");
    }

    struct BrokenFile {
        writes: usize,
    }

    impl Write for BrokenFile {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drain_logs_keeps_draining_after_write_failure() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for line in ["--- Sample 1 ---", "0", "0"] {
            tx.send(line.to_string()).unwrap();
        }
        drop(tx);

        let mut file = BrokenFile { writes: 0 };
        let err = drain_logs(&mut rx, &mut file).await;

        assert!(err.unwrap().to_string().contains("disk full"));
        assert_eq!(file.writes, 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drain_logs_appends_every_line() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send("a".to_string()).unwrap();
        tx.send("b".to_string()).unwrap();
        drop(tx);

        let mut buf = Vec::new();
        assert!(drain_logs(&mut rx, &mut buf).await.is_none());
        assert_eq!(buf, b"a\nb\n");
    }

    #[test]
    fn test_log_file_header_then_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let path = path.to_str().unwrap();

        let mut file = init_log_file(path).unwrap();
        append_line(&mut file, "--- Sample 1 ---").unwrap();
        drop(file);

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.ends_with("--- Sample 1 ---\n"));
    }
}
