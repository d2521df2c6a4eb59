//! 批处理参数
//!
//! 调用方一次性提供，运行期间不可变。

use crate::config::Config;
use crate::error::{ConfigError, InputError};
use crate::models::selection::SampleSelection;
use std::path::PathBuf;

/// 批处理参数（不可变值对象）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchParams {
    pub workspace: PathBuf,
    pub output_dir: PathBuf,
    pub core_exe: PathBuf,
    pub duration_hours: u32,
    pub selection: SampleSelection,
}

impl BatchParams {
    pub fn new(
        workspace: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        core_exe: impl Into<PathBuf>,
        duration_hours: u32,
        selection: SampleSelection,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            output_dir: output_dir.into(),
            core_exe: core_exe.into(),
            duration_hours,
            selection,
        }
    }

    /// 从配置构建，解析选择文本
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        for (name, value) in [
            ("workspace", &config.workspace),
            ("output_dir", &config.output_dir),
            ("core_exe", &config.core_exe),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::MissingField(name).into());
            }
        }
        let selection: SampleSelection = config.selection.parse()?;
        Ok(Self::new(
            &config.workspace,
            &config.output_dir,
            &config.core_exe,
            config.duration_hours,
            selection,
        ))
    }

    /// 每个样本的输出子目录：`<output_dir>/sample_<id>`
    pub fn sample_output_dir(&self, sample_id: u64) -> PathBuf {
        self.output_dir.join(format!("sample_{}", sample_id))
    }

    /// 不涉及文件系统的检查
    pub(crate) fn check_values(&self) -> Result<(), InputError> {
        if self.duration_hours == 0 {
            return Err(InputError::InvalidDuration);
        }
        Ok(())
    }
}
