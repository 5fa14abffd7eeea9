//! 文档句柄与旋转角度

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 文档句柄
///
/// 二进制内容 + 稳定的文件名。文件名即身份，不按内容去重。
/// 内容以 `Arc` 共享，提交流程只借用，不拿走所有权。
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    name: String,
    content: Arc<[u8]>,
}

impl DocumentHandle {
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 字节数
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .finish()
    }
}

/// 旋转角度，取值只可能是 0 / 90 / 180 / 270
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Rotation(u16);

impl Rotation {
    pub const ZERO: Rotation = Rotation(0);

    /// 顺时针旋转 90°，270 之后回到 0
    pub fn advance(self) -> Self {
        Rotation((self.0 + 90) % 360)
    }

    /// 从任意 90 的整数倍（含负数）归一化
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Rotation(degrees.rem_euclid(360) as u16))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Rotation {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rotation::from_degrees(value).ok_or_else(|| format!("旋转角度必须是 90 的倍数: {}", value))
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}
