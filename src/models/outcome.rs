//! 批处理结果

use crate::error::BatchError;

/// 单个样本的运行记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRun {
    pub sample_id: u64,
    pub exit_code: i32,
}

/// 批处理终态
#[derive(Debug)]
pub enum RunOutcome {
    /// 所有选中样本的退出码都为 0
    Completed { runs: Vec<SampleRun> },
    /// 失败；`runs` 是失败前已完成的样本
    Failed { runs: Vec<SampleRun>, error: BatchError },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn runs(&self) -> &[SampleRun] {
        match self {
            RunOutcome::Completed { runs } | RunOutcome::Failed { runs, .. } => runs,
        }
    }

    pub fn error(&self) -> Option<&BatchError> {
        match self {
            RunOutcome::Completed { .. } => None,
            RunOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// 失败归属的样本 ID
    pub fn failed_sample(&self) -> Option<u64> {
        self.error().and_then(BatchError::sample_id)
    }
}
