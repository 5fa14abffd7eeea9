//! 文件行与状态提示
//!
//! 只读取 [`CollectionState`]，不修改任何状态。

use std::fmt;

use crate::models::{BrokenReason, Rotation};
use crate::store::CollectionState;

use super::format::{format_file_size, truncate_filename, FILENAME_TRUNCATE_LIMIT};

/// 单个文件的展示状态，同一文件只取优先级最高的一个
///
/// 优先级：损坏 > 加密 > 密码待验证 > 已验证 > 就绪。
/// 损坏的文件无法通过输入密码修复，所以排在加密之前。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Broken(BrokenReason),
    Locked,
    PasswordUnverified,
    Verified,
    Ready,
}

impl RowStatus {
    pub fn color(&self) -> RowColor {
        match self {
            RowStatus::Broken(_) => RowColor::Orange,
            RowStatus::Locked | RowStatus::PasswordUnverified => RowColor::Red,
            RowStatus::Verified => RowColor::Green,
            RowStatus::Ready => RowColor::Neutral,
        }
    }

    pub fn blocks_submission(&self) -> bool {
        matches!(
            self,
            RowStatus::Broken(_) | RowStatus::Locked | RowStatus::PasswordUnverified
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowColor {
    Neutral,
    Green,
    Red,
    Orange,
}

impl RowColor {
    pub fn as_str(self) -> &'static str {
        match self {
            RowColor::Neutral => "neutral",
            RowColor::Green => "green",
            RowColor::Red => "red",
            RowColor::Orange => "orange",
        }
    }
}

/// 文件列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    /// 从 1 开始
    pub position: usize,
    pub name: String,
    pub display_name: String,
    pub size_label: String,
    pub rotation: Rotation,
    pub status: RowStatus,
    pub color: RowColor,
    /// 损坏原因等附加说明
    pub message: Option<String>,
}

impl fmt::Display for FileRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match &self.status {
            RowStatus::Broken(_) => "⚠️",
            RowStatus::Locked => "🔒",
            RowStatus::PasswordUnverified => "🔑",
            RowStatus::Verified => "🔓",
            RowStatus::Ready => "📄",
        };
        write!(
            f,
            "{:>3}. {} {:<20} {:>10}",
            self.position, marker, self.display_name, self.size_label
        )?;
        if !self.rotation.is_zero() {
            write!(f, "  ↻{}", self.rotation)?;
        }
        if let Some(message) = &self.message {
            write!(f, "  {}", message)?;
        }
        Ok(())
    }
}

/// 列表上方的整体提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusBanner {
    Locked { count: usize },
    Broken { count: usize },
}

impl fmt::Display for StatusBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusBanner::Locked { count } => write!(
                f,
                "{} locked file(s) found. Click the red locks to enter a password.",
                count
            ),
            StatusBanner::Broken { .. } => write!(f, "Please remove broken files to continue."),
        }
    }
}

/// 按集合顺序生成所有文件行
pub fn render_rows(state: &CollectionState) -> Vec<FileRow> {
    state
        .documents()
        .iter()
        .enumerate()
        .filter_map(|(idx, doc)| {
            let entry = state.entry(doc.name())?;
            let status = if let Some(reason) = &entry.broken {
                RowStatus::Broken(reason.clone())
            } else if entry.locked {
                RowStatus::Locked
            } else if entry.has_unverified_password() {
                RowStatus::PasswordUnverified
            } else if entry.verified {
                RowStatus::Verified
            } else {
                RowStatus::Ready
            };
            let message = match &status {
                RowStatus::Broken(reason) => Some(reason.to_string()),
                _ => None,
            };

            Some(FileRow {
                position: idx + 1,
                name: doc.name().to_string(),
                display_name: truncate_filename(doc.name(), FILENAME_TRUNCATE_LIMIT),
                size_label: format_file_size(doc.size() as u64),
                rotation: entry.rotation,
                color: status.color(),
                status,
                message,
            })
        })
        .collect()
}

/// 当前最需要用户处理的问题
///
/// 损坏文件只能删除，所以优先提示；其次是加密文件的数量。
pub fn banner(state: &CollectionState) -> Option<StatusBanner> {
    let broken = state.broken_names().len();
    if broken > 0 {
        return Some(StatusBanner::Broken { count: broken });
    }
    let locked = state.locked_names().len();
    if locked > 0 {
        return Some(StatusBanner::Locked { count: locked });
    }
    None
}
