//! 共享 SIMX 文档 - 基础设施层
//!
//! 以 windows-1252 整体读入内存，做纯文本的标签替换后整体写回。
//! 不做 XML 解析：core 对这个文件的字节格式有要求，只动三个字段。

use crate::error::InfrastructureError;
use encoding_rs::WINDOWS_1252;
use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const TAG_INX_FILE: &str = "INXFile";
pub const TAG_OUT_DIR: &str = "outDir";
pub const TAG_SIM_DURATION: &str = "simDuration";

/// 路径分隔符统一为 `/`
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// 内存中的 SIMX 文档
///
/// 每个样本读一次、改三处、写一次。
#[derive(Debug, Clone)]
pub struct SimxDocument {
    path: PathBuf,
    content: String,
}

impl SimxDocument {
    /// 读入文档
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let path = path.into();
        let bytes = fs::read(&path)
            .await
            .map_err(|source| InfrastructureError::SimxRead {
                path: path.clone(),
                source,
            })?;
        let (content, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        Ok(Self {
            content: content.into_owned(),
            path,
        })
    }

    /// 由已有文本构建（不落盘）
    pub fn from_text(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 把每一处 `<tag>...</tag>` 替换为 `<tag> value </tag>`
    ///
    /// 非贪婪，可跨行；返回替换次数。重复调用结果不变。
    pub fn set_field(&mut self, tag: &str, value: &str) -> Result<usize, InfrastructureError> {
        let escaped = regex::escape(tag);
        let pattern = format!(r"(?s)<{escaped}>.*?</{escaped}>");
        let re = Regex::new(&pattern).map_err(|source| InfrastructureError::TagPattern {
            tag: tag.to_string(),
            source,
        })?;
        let count = re.find_iter(&self.content).count();
        let replacement = format!("<{tag}> {value} </{tag}>");
        self.content = re
            .replace_all(&self.content, NoExpand(&replacement))
            .into_owned();
        debug!("SIMX 字段 <{}> 替换 {} 处", tag, count);
        Ok(count)
    }

    /// 指向某个样本：输入文件、输出目录、时长
    pub fn point_at_sample(
        &mut self,
        sample_id: u64,
        out_dir: &Path,
        duration_hours: u32,
    ) -> Result<(), InfrastructureError> {
        self.set_field(TAG_INX_FILE, &format!("sample_{}.INX", sample_id))?;
        self.set_field(TAG_OUT_DIR, &normalize_path(out_dir))?;
        self.set_field(TAG_SIM_DURATION, &duration_hours.to_string())?;
        Ok(())
    }

    /// 以 windows-1252 写回原路径
    pub async fn save(&self) -> Result<(), InfrastructureError> {
        let bytes = self.encode()?;
        fs::write(&self.path, bytes)
            .await
            .map_err(|source| InfrastructureError::SimxWrite {
                path: self.path.clone(),
                source,
            })
    }

    fn encode(&self) -> Result<Vec<u8>, InfrastructureError> {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(&self.content);
        if had_errors {
            let offending = self
                .content
                .chars()
                .find(|c| {
                    let mut buf = [0u8; 4];
                    WINDOWS_1252.encode(c.encode_utf8(&mut buf)).2
                })
                .map(String::from)
                .unwrap_or_default();
            return Err(InfrastructureError::SimxEncode {
                path: self.path.clone(),
                ch: offending,
            });
        }
        Ok(bytes.into_owned())
    }
}
