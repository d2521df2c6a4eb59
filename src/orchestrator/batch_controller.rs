//! 批处理控制器 - 编排层
//!
//! 状态机：`Idle → Validating → Running → {Completed | Failed}`
//!
//! 样本严格串行：同一时刻最多一个 core 子进程，共享 SIMX 文档
//! 每个样本读改写一次。

use crate::error::{BatchError, BatchResult, InfrastructureError, InputError, SampleFailure};
use crate::infrastructure::{CoreProcess, SimxDocument};
use crate::models::{select_samples, BatchParams, RunOutcome, SampleRun};
use crate::services::{discover_samples, find_simx, LogSink};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

/// 批处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Idle,
    Validating,
    Running,
    Completed,
    Failed,
}

/// 校验通过后的路径（均为绝对路径）
#[derive(Debug)]
struct ValidatedPaths {
    workspace: PathBuf,
    output_dir: PathBuf,
    core_exe: PathBuf,
}

/// 运行一个批次，直到终态
///
/// 所有致命错误都会写入日志，并通过 `RunOutcome::Failed` 返回。
pub async fn run_batch(params: &BatchParams, sink: &LogSink) -> RunOutcome {
    let mut state = BatchState::Idle;
    let mut runs = Vec::new();

    let result = drive(params, sink, &mut state, &mut runs).await;

    match result {
        Ok(()) => {
            transition(&mut state, BatchState::Completed);
            sink.line("");
            sink.line("=== All simulations completed successfully ===");
            info!("✅ 全部 {} 个样本模拟完成", runs.len());
            RunOutcome::Completed { runs }
        }
        Err(error) => {
            transition(&mut state, BatchState::Failed);
            sink.line("");
            sink.line(format!("ERROR: {}", error));
            error!("❌ 批处理失败: {}", error);
            RunOutcome::Failed { runs, error }
        }
    }
}

async fn drive(
    params: &BatchParams,
    sink: &LogSink,
    state: &mut BatchState,
    runs: &mut Vec<SampleRun>,
) -> BatchResult<()> {
    transition(state, BatchState::Validating);
    let paths = validate(params).await?;

    let ids = discover_samples(&paths.workspace).await?;
    let selected = select_samples(&ids, &params.selection)?;
    info!(
        "✓ 发现 {} 个样本，本次运行 {} 个 (选择: {})",
        ids.len(),
        selected.len(),
        params.selection
    );

    fs::create_dir_all(&paths.output_dir)
        .await
        .map_err(|e| InputError::OutputNotCreatable {
            path: paths.output_dir.clone(),
            reason: e.to_string(),
        })?;

    transition(state, BatchState::Running);
    sink.line("");
    sink.line("=== Starting batch simulation ===");

    let simx = find_simx(&paths.workspace).await?;
    info!("📄 SIMX 文档: {}", simx.display());

    for &sample_id in &selected {
        let exit_code = run_sample(sample_id, params, &paths, &simx, sink).await?;
        runs.push(SampleRun {
            sample_id,
            exit_code,
        });
    }
    Ok(())
}

/// 运行单个样本，只在退出码为 0 时返回 Ok
async fn run_sample(
    sample_id: u64,
    params: &BatchParams,
    paths: &ValidatedPaths,
    simx: &Path,
    sink: &LogSink,
) -> BatchResult<i32> {
    sink.line("");
    sink.line(format!("--- Sample {} ---", sample_id));
    info!("[样本 {}] 开始处理", sample_id);

    let out_dir = paths.output_dir.join(format!("sample_{}", sample_id));
    fs::create_dir_all(&out_dir)
        .await
        .map_err(|source| InfrastructureError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

    let mut doc = SimxDocument::load(simx).await?;
    doc.point_at_sample(sample_id, &out_dir, params.duration_hours)?;
    doc.save().await?;
    debug!("[样本 {}] SIMX 已更新", sample_id);

    let process = CoreProcess::new(&paths.core_exe, &paths.workspace, simx);
    let fail = |failure| BatchError::SampleExecution {
        sample_id,
        failure,
    };
    match process.run(sink).await.map_err(fail)? {
        Some(0) => {
            info!("[样本 {}] ✓ 完成", sample_id);
            Ok(0)
        }
        Some(code) => Err(fail(SampleFailure::NonZeroExit(code))),
        None => Err(fail(SampleFailure::Terminated)),
    }
}

/// 参数校验，不产生副作用
async fn validate(params: &BatchParams) -> Result<ValidatedPaths, InputError> {
    params.check_values()?;

    let workspace = std::path::absolute(&params.workspace).map_err(|_| {
        InputError::WorkspaceNotValid {
            path: params.workspace.clone(),
        }
    })?;
    if !is_dir(&workspace).await {
        return Err(InputError::WorkspaceNotValid { path: workspace });
    }

    let output_dir = std::path::absolute(&params.output_dir).map_err(|e| {
        InputError::OutputNotCreatable {
            path: params.output_dir.clone(),
            reason: e.to_string(),
        }
    })?;
    if let Ok(meta) = fs::metadata(&output_dir).await {
        if !meta.is_dir() {
            return Err(InputError::OutputNotCreatable {
                path: output_dir,
                reason: "exists and is not a directory".to_string(),
            });
        }
    }

    let core_exe = std::path::absolute(&params.core_exe).map_err(|_| {
        InputError::CoreExeNotFound {
            path: params.core_exe.clone(),
        }
    })?;
    let exe_is_file = fs::metadata(&core_exe)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !exe_is_file {
        return Err(InputError::CoreExeNotFound { path: core_exe });
    }

    Ok(ValidatedPaths {
        workspace,
        output_dir,
        core_exe,
    })
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

fn transition(state: &mut BatchState, next: BatchState) {
    debug!("批处理状态: {:?} → {:?}", state, next);
    *state = next;
}
