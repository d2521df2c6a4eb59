//! 程序配置
//!
//! 先读可选的 TOML 文件，再用环境变量覆盖。

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 工作区目录（含 sample_*.INX 与 .SIMX）
    pub workspace: PathBuf,
    /// 输出根目录，每个样本一个子目录
    pub output_dir: PathBuf,
    /// ENVI-met core 可执行文件
    pub core_exe: PathBuf,
    /// 模拟时长（小时）
    pub duration_hours: u32,
    /// 样本选择：`all`、`<id>` 或 `<lo>-<hi>`
    pub selection: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 只列出样本，不运行
    pub list_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: PathBuf::new(),
            output_dir: PathBuf::new(),
            core_exe: PathBuf::new(),
            duration_hours: 2,
            selection: "all".to_string(),
            output_log_file: "batch_log.txt".to_string(),
            list_only: false,
        }
    }
}

impl Config {
    /// 只从环境变量构建
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// 从 TOML 文件加载，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 用环境变量覆盖已有字段
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = var("ENVI_WORKSPACE") {
            self.workspace = PathBuf::from(v);
        }
        if let Some(v) = var("ENVI_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = var("ENVI_CORE_EXE") {
            self.core_exe = PathBuf::from(v);
        }
        if let Some(v) = var("ENVI_DURATION_HOURS") {
            self.duration_hours = parse_var("ENVI_DURATION_HOURS", &v, "u32")?;
        }
        if let Some(v) = var("ENVI_SAMPLES") {
            self.selection = v;
        }
        if let Some(v) = var("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Some(v) = var("ENVI_LIST_ONLY") {
            self.list_only = parse_var("ENVI_LIST_ONLY", &v, "bool")?;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        }
        .into()
    })
}
