//! PDF 服务客户端
//!
//! `PdfApi` 是与远程 PDF 服务之间唯一的接缝：上层只依赖这个 trait，
//! 生产环境用 [`PdfApiClient`]，测试里可以换成内存实现。

pub mod pdf_api_client;

pub use pdf_api_client::PdfApiClient;

use crate::error::ApiError;
use crate::models::{
    DocumentHandle, PasswordCheckResponse, TransformOutput, TransformRequest, ValidationReport,
};
use async_trait::async_trait;

#[async_trait]
pub trait PdfApi: Send + Sync {
    /// 批量完整性校验，返回文件名 → 结果
    async fn validate(&self, documents: &[DocumentHandle]) -> Result<ValidationReport, ApiError>;

    /// 检查密码能否打开文件；不传密码时等价于询问"文件是否加密"
    async fn check_password(
        &self,
        document: &DocumentHandle,
        password: Option<&str>,
    ) -> Result<PasswordCheckResponse, ApiError>;

    /// 执行转换。423 以 [`ApiError::Locked`] 返回
    async fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, ApiError>;

    /// 服务健康检查，返回服务端的欢迎信息
    async fn health(&self) -> Result<String, ApiError>;
}
