//! 单个文档的元数据记录

use super::document::Rotation;
use std::fmt;

/// 文件被判定为损坏的原因类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenKind {
    /// 服务端校验明确拒绝（附带服务端给出的错误类型）
    Rejected { error_type: Option<String> },
    /// 校验响应里缺少该文件
    MissingVerdict,
    /// 校验请求没能完成
    Connection,
}

/// 损坏原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenReason {
    pub kind: BrokenKind,
    pub message: String,
}

impl BrokenReason {
    pub fn rejected(error_type: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: BrokenKind::Rejected { error_type },
            message: message.into(),
        }
    }

    pub fn missing() -> Self {
        Self {
            kind: BrokenKind::MissingVerdict,
            message: "Unknown error".to_string(),
        }
    }

    pub fn connection() -> Self {
        Self {
            kind: BrokenKind::Connection,
            message: "Connection error".to_string(),
        }
    }
}

impl fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BrokenKind::Rejected {
                error_type: Some(error_type),
            } => write!(f, "{}: {}", error_type, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// 文档条目
///
/// 不变量：`verified` 为真时 `password` 一定存在。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentEntry {
    pub password: Option<String>,
    pub verified: bool,
    pub locked: bool,
    pub broken: Option<BrokenReason>,
    pub rotation: Rotation,
    /// 加入集合时分配的批次号，同名文件删除后再加入会拿到新值
    pub generation: u64,
}

impl DocumentEntry {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// 设置了密码但还没有被服务端确认
    pub fn has_unverified_password(&self) -> bool {
        self.password.is_some() && !self.verified
    }

    /// 是否阻塞提交
    pub fn blocks_submission(&self) -> bool {
        self.is_broken() || self.locked || self.has_unverified_password()
    }

    /// 只有已验证的密码才会随请求发出
    pub fn verified_password(&self) -> Option<&str> {
        if self.verified {
            self.password.as_deref()
        } else {
            None
        }
    }
}
