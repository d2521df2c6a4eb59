//! 样本选择
//!
//! 把用户给出的范围（全部 / 单个 ID / 闭区间）解析到已发现的样本 ID 上。

use crate::error::InputError;
use std::fmt;
use std::str::FromStr;

/// 选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    All,
    Single,
    Range,
}

/// 解析后的选择请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSelection {
    All,
    Single(u64),
    /// 闭区间；`lo > hi` 合法，只是匹配为空
    Range { lo: u64, hi: u64 },
}

impl SampleSelection {
    /// 按显式模式解析参数文本
    ///
    /// `All` 模式忽略 `text`。
    pub fn parse(mode: SelectionMode, text: &str) -> Result<Self, InputError> {
        let text = text.trim();
        match mode {
            SelectionMode::All => Ok(SampleSelection::All),
            SelectionMode::Single => text
                .parse::<u64>()
                .map(SampleSelection::Single)
                .map_err(|_| InputError::InvalidSampleId {
                    text: text.to_string(),
                }),
            SelectionMode::Range => {
                let invalid = || InputError::InvalidRange {
                    text: text.to_string(),
                };
                let (lo, hi) = text.split_once('-').ok_or_else(invalid)?;
                let lo = lo.trim().parse::<u64>().map_err(|_| invalid())?;
                let hi = hi.trim().parse::<u64>().map_err(|_| invalid())?;
                Ok(SampleSelection::Range { lo, hi })
            }
        }
    }
}

/// 自由文本：`all`、`<id>` 或 `<lo>-<hi>`（含 `-` 即视为区间）
impl FromStr for SampleSelection {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("all") {
            Self::parse(SelectionMode::All, text)
        } else if text.contains('-') {
            Self::parse(SelectionMode::Range, text)
        } else {
            Self::parse(SelectionMode::Single, text)
        }
    }
}

impl fmt::Display for SampleSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSelection::All => write!(f, "all"),
            SampleSelection::Single(id) => write!(f, "{}", id),
            SampleSelection::Range { lo, hi } => write!(f, "{}-{}", lo, hi),
        }
    }
}

/// 从已排序的样本 ID 中选出要运行的子序列，保持升序
pub fn select_samples(ids: &[u64], selection: &SampleSelection) -> Result<Vec<u64>, InputError> {
    match *selection {
        SampleSelection::All => Ok(ids.to_vec()),
        SampleSelection::Single(id) => {
            if ids.contains(&id) {
                Ok(vec![id])
            } else {
                Err(InputError::SampleNotFound(id))
            }
        }
        SampleSelection::Range { lo, hi } => {
            let selected: Vec<u64> = ids
                .iter()
                .copied()
                .filter(|id| (lo..=hi).contains(id))
                .collect();
            if selected.is_empty() {
                Err(InputError::EmptyRange { lo, hi })
            } else {
                Ok(selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> SampleSelection {
        SampleSelection::parse(SelectionMode::Range, text).unwrap()
    }

    #[test]
    fn test_range_selection() {
        assert_eq!(select_samples(&[0, 2, 5, 9], &range("2-9")).unwrap(), vec![2, 5, 9]);
        assert!(matches!(
            select_samples(&[0, 2, 5], &range("9-20")),
            Err(InputError::EmptyRange { lo: 9, hi: 20 })
        ));
    }

    #[test]
    fn test_single_selection() {
        let ids = [0, 2, 5];
        let two = SampleSelection::parse(SelectionMode::Single, "2").unwrap();
        assert_eq!(select_samples(&ids, &two).unwrap(), vec![2]);

        let three = SampleSelection::parse(SelectionMode::Single, "3").unwrap();
        assert!(matches!(
            select_samples(&ids, &three),
            Err(InputError::SampleNotFound(3))
        ));
    }

    #[test]
    fn test_all_returns_everything() {
        assert_eq!(
            select_samples(&[1, 4, 7], &SampleSelection::All).unwrap(),
            vec![1, 4, 7]
        );
    }

    #[test]
    fn test_inverted_range_is_empty_not_swapped() {
        let sel = range("9-2");
        assert_eq!(sel, SampleSelection::Range { lo: 9, hi: 2 });
        assert!(matches!(
            select_samples(&[2, 5, 9], &sel),
            Err(InputError::EmptyRange { lo: 9, hi: 2 })
        ));
    }

    #[test]
    fn test_malformed_input() {
        for bad in ["4-", "-10", "a-b", "4-10-12", "4"] {
            assert!(
                matches!(
                    SampleSelection::parse(SelectionMode::Range, bad),
                    Err(InputError::InvalidRange { .. })
                ),
                "应拒绝区间: {}",
                bad
            );
        }
        assert!(matches!(
            SampleSelection::parse(SelectionMode::Single, "x"),
            Err(InputError::InvalidSampleId { .. })
        ));
    }

    #[test]
    fn test_free_text_detection() {
        assert_eq!("all".parse::<SampleSelection>().unwrap(), SampleSelection::All);
        assert_eq!(" ALL ".parse::<SampleSelection>().unwrap(), SampleSelection::All);
        assert_eq!("7".parse::<SampleSelection>().unwrap(), SampleSelection::Single(7));
        assert_eq!(
            "4 - 10".parse::<SampleSelection>().unwrap(),
            SampleSelection::Range { lo: 4, hi: 10 }
        );
        assert_eq!(SampleSelection::Range { lo: 4, hi: 10 }.to_string(), "4-10");
    }
}
