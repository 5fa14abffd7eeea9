//! 缩略图渲染接口
//!
//! 渲染本身由外部完成（文档 + 可选密码 → 首页预览图），这里只定义接缝。

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DocumentHandle;

/// 首页预览图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("预览生成失败: {message}")]
pub struct PreviewError {
    pub message: String,
}

#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render(&self, document: &DocumentHandle, password: Option<&str>) -> Result<Preview, PreviewError>;
}
