//! 批处理前端入口 - 编排层
//!
//! 调用方（前端）不阻塞：批处理在独立任务中运行，日志经通道回传。
//! "运行中"标志相当于禁用的运行按钮，批处理到达任一终态后无条件复位。

use crate::error::BatchError;
use crate::models::{BatchParams, RunOutcome};
use crate::orchestrator::batch_controller::run_batch;
use crate::services::LogSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 已有批处理在运行
#[derive(Debug, Error)]
#[error("A batch is already running.")]
pub struct AlreadyRunning;

/// 批处理启动器
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    running: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否有批处理正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 启动一个批次
    ///
    /// 返回日志读端和任务句柄。任务结束后日志通道自动关闭。
    pub fn start(
        &self,
        params: BatchParams,
    ) -> Result<(UnboundedReceiver<String>, BatchTask), AlreadyRunning> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("⚠️ 已有批处理在运行，忽略本次启动");
            return Err(AlreadyRunning);
        }
        let guard = RunningGuard(self.running.clone());

        let (sink, logs) = LogSink::channel();
        info!("🚀 启动批处理: {}", params.workspace.display());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            run_batch(&params, &sink).await
        });

        Ok((logs, BatchTask { handle }))
    }
}

/// 运行中的批处理任务
#[derive(Debug)]
pub struct BatchTask {
    handle: JoinHandle<RunOutcome>,
}

impl BatchTask {
    /// 等待终态
    pub async fn wait(self) -> RunOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::Failed {
                runs: Vec::new(),
                error: BatchError::Aborted(e.to_string()),
            },
        }
    }
}

/// 释放时复位运行标志（包括 panic 路径）
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
