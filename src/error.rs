//! 错误类型
//!
//! 分三层：输入错误（批处理尚未开始）、基础设施错误（共享 SIMX 文档等）、
//! 样本执行错误（归属到具体的样本 ID）。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 批处理错误
#[derive(Debug, Error)]
pub enum BatchError {
    /// 输入错误：在任何副作用之前报告
    #[error("Input Error: {0}")]
    Input(#[from] InputError),
    /// 基础设施错误：立即中止剩余工作
    #[error("{0}")]
    Infrastructure(#[from] InfrastructureError),
    /// 样本执行错误
    #[error("Sample {sample_id} failed ({failure})")]
    SampleExecution {
        sample_id: u64,
        failure: SampleFailure,
    },
    /// 批处理任务异常结束（panic 或被取消）
    #[error("Batch task aborted: {0}")]
    Aborted(String),
}

impl BatchError {
    /// 失败归属的样本 ID（仅样本执行错误有）
    pub fn sample_id(&self) -> Option<u64> {
        match self {
            BatchError::SampleExecution { sample_id, .. } => Some(*sample_id),
            _ => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, BatchError::Input(_))
    }
}

/// 输入错误
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Workspace folder not valid.")]
    WorkspaceNotValid { path: PathBuf },

    #[error("Output directory not usable ({}): {reason}", path.display())]
    OutputNotCreatable { path: PathBuf, reason: String },

    #[error("Core executable not found.")]
    CoreExeNotFound { path: PathBuf },

    #[error("Duration must be a positive number of hours.")]
    InvalidDuration,

    #[error("Cannot read workspace {}: {source}", path.display())]
    WorkspaceUnreadable { path: PathBuf, source: io::Error },

    #[error("No sample_*.INX files found in workspace.")]
    NoSamples { path: PathBuf },

    #[error("Invalid range format. Use e.g. 4-10.")]
    InvalidRange { text: String },

    #[error("Sample ID must be an integer or range.")]
    InvalidSampleId { text: String },

    #[error("Sample ID {0} not found.")]
    SampleNotFound(u64),

    #[error("No samples found in range {lo}-{hi}.")]
    EmptyRange { lo: u64, hi: u64 },
}

/// 基础设施错误
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("No .SIMX file found in workspace.")]
    SimxNotFound { workspace: PathBuf },

    #[error("Cannot read {}: {source}", path.display())]
    SimxRead { path: PathBuf, source: io::Error },

    #[error("Cannot write {}: {source}", path.display())]
    SimxWrite { path: PathBuf, source: io::Error },

    #[error("Cannot encode {} as windows-1252: '{ch}'", path.display())]
    SimxEncode { path: PathBuf, ch: String },

    #[error("Invalid pattern for <{tag}>: {source}")]
    TagPattern { tag: String, source: regex::Error },

    #[error("Cannot scan workspace {}: {source}", path.display())]
    WorkspaceScan { path: PathBuf, source: io::Error },

    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir { path: PathBuf, source: io::Error },
}

/// 单个样本的失败原因
#[derive(Debug, Error)]
pub enum SampleFailure {
    #[error("exit {0}")]
    NonZeroExit(i32),

    #[error("terminated without exit code")]
    Terminated,

    #[error("launch failed: {0}")]
    Launch(io::Error),

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("runner task aborted: {0}")]
    Aborted(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填字段为空
    #[error("缺少必填配置项: {0}")]
    MissingField(&'static str),
}

/// 批处理结果类型
pub type BatchResult<T> = Result<T, BatchError>;
