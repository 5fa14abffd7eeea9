//! 服务端转换工具
//!
//! 合并是主流程，其余工具（拆分、压缩、删页、加密、解密）共用同一套
//! 就绪检查、请求构造和 423 恢复逻辑，只在接口路径和附加字段上不同。

use serde::{Deserialize, Serialize};

/// 压缩等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    Extreme,
    #[default]
    Recommended,
    Less,
}

impl CompressionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Extreme => "extreme",
            CompressionLevel::Recommended => "recommended",
            CompressionLevel::Less => "less",
        }
    }
}

/// 一次提交要执行的转换
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// 按集合顺序合并所有文件
    #[default]
    Merge,
    /// 按页码范围拆分，如 "1-3, 5"
    Split { ranges: String },
    Compress {
        #[serde(default)]
        level: CompressionLevel,
    },
    /// 删除指定页
    DeletePages { pages: String },
    /// 用新密码加密所有文件
    Lock { new_password: String },
    /// 去掉单个文件的密码保护
    Unlock,
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Merge => "merge",
            Transform::Split { .. } => "split",
            Transform::Compress { .. } => "compress",
            Transform::DeletePages { .. } => "delete_pages",
            Transform::Lock { .. } => "lock",
            Transform::Unlock => "unlock",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Transform::Merge => "/merge",
            Transform::Split { .. } => "/split_pdf",
            Transform::Compress { .. } => "/compress_pdf",
            Transform::DeletePages { .. } => "/delete-pages",
            Transform::Lock { .. } => "/lock-pdf",
            Transform::Unlock => "/unlock-pdf",
        }
    }

    /// 是否接受多个文件；否则必须恰好一个
    pub fn accepts_batch(&self) -> bool {
        matches!(self, Transform::Merge | Transform::Lock { .. })
    }

    /// multipart 中文件字段名
    pub fn file_field(&self) -> &'static str {
        if self.accepts_batch() {
            "files"
        } else {
            "file"
        }
    }

    /// 工具自身的表单字段
    ///
    /// 解锁用的 `password` 来自集合中已验证的密码，由 [`crate::workflow::submission::prepare`] 补上。
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Transform::Merge | Transform::Unlock => Vec::new(),
            Transform::Split { ranges } => vec![("ranges", ranges.clone())],
            Transform::Compress { level } => vec![("level", level.as_str().to_string())],
            Transform::DeletePages { pages } => vec![("pages", pages.clone())],
            Transform::Lock { new_password } => vec![("password", new_password.clone())],
        }
    }

    /// 服务端没有给出文件名时使用的默认名
    pub fn default_output_name(&self, first_document: &str) -> String {
        match self {
            Transform::Merge => "merged.pdf".to_string(),
            Transform::Split { .. } => format!("split_{}", first_document),
            Transform::Compress { level } => {
                format!("compressed_{}_{}", level.as_str(), first_document)
            }
            Transform::DeletePages { .. } => "edited.pdf".to_string(),
            Transform::Lock { .. } => format!("locked_{}", first_document),
            Transform::Unlock => format!("unlocked_{}", first_document),
        }
    }
}
