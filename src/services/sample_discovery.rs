//! 样本发现 - 业务能力层
//!
//! 扫描工作区，找出 `sample_<N>.INX` 样本和共享的 `.SIMX` 文档。

use crate::error::{InfrastructureError, InputError};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, warn};

/// 基名精确匹配，扩展名不区分大小写
static SAMPLE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sample_(\d+)\.(?i:inx)$").expect("样本文件名正则无效"));

/// 从文件名中提取样本 ID，不匹配返回 None
pub fn sample_id_from_name(file_name: &str) -> Option<u64> {
    let caps = SAMPLE_FILE.captures(file_name)?;
    match caps[1].parse() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("样本编号超出范围，已忽略: {}", file_name);
            None
        }
    }
}

/// 扫描目录，返回升序去重的样本 ID
///
/// 一个都没找到时返回输入错误。
pub async fn discover_samples(workspace: &Path) -> Result<Vec<u64>, InputError> {
    let unreadable = |source| InputError::WorkspaceUnreadable {
        path: workspace.to_path_buf(),
        source,
    };

    let mut ids = BTreeSet::new();
    let mut entries = fs::read_dir(workspace).await.map_err(unreadable)?;
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(id) = sample_id_from_name(name) {
            debug!("发现样本 {}: {}", id, name);
            ids.insert(id);
        }
    }

    if ids.is_empty() {
        return Err(InputError::NoSamples {
            path: workspace.to_path_buf(),
        });
    }
    Ok(ids.into_iter().collect())
}

/// 查找工作区里的 `.SIMX` 文档（扩展名不区分大小写）
///
/// 多于一个时按文件名排序取第一个，并给出警告。
pub async fn find_simx(workspace: &Path) -> Result<PathBuf, InfrastructureError> {
    let scan_failed = |source| InfrastructureError::WorkspaceScan {
        path: workspace.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    let mut entries = fs::read_dir(workspace).await.map_err(scan_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(scan_failed)? {
        let path = entry.path();
        let is_simx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("simx"));
        if !is_simx {
            continue;
        }
        let file_type = entry.file_type().await.map_err(scan_failed)?;
        let is_file = if file_type.is_symlink() {
            fs::metadata(&path).await.is_ok_and(|meta| meta.is_file())
        } else {
            file_type.is_file()
        };
        if is_file {
            candidates.push(path);
        }
    }
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            "⚠️ 工作区中有 {} 个 .SIMX 文件，使用 {}",
            candidates.len(),
            candidates[0].display()
        );
    }
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| InfrastructureError::SimxNotFound {
            workspace: workspace.to_path_buf(),
        })
}
