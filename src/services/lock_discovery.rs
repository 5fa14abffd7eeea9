//! 加密探测服务 - 业务能力层
//!
//! 文件是否加密只以服务端的密码检查结果为准。预览失败只是触发探测的信号，
//! 本身不能证明文件加密（也可能是文件损坏）。

use std::sync::Arc;

use tracing::debug;

use crate::clients::PdfApi;
use crate::error::ApiError;
use crate::models::DocumentHandle;

/// 一次密码检查的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCheck {
    /// 能打开（未加密，或者密码正确）
    Opens,
    /// 打不开，附带服务端的错误信息
    Rejected { message: String },
}

impl LockCheck {
    pub fn is_verified(&self) -> bool {
        matches!(self, LockCheck::Opens)
    }
}

/// 加密探测服务
pub struct LockDiscovery<A> {
    api: Arc<A>,
}

impl<A: PdfApi> LockDiscovery<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// 检查密码能否打开文件
    ///
    /// # 参数
    /// - `document`: 待检查的文件
    /// - `password`: 候选密码，`None` 时只探测文件是否加密
    pub async fn check(&self, document: &DocumentHandle, password: Option<&str>) -> Result<LockCheck, ApiError> {
        let response = self.api.check_password(document, password).await?;
        debug!("[{}] 密码检查结果: ok={}", document.name(), response.ok);

        if response.ok {
            Ok(LockCheck::Opens)
        } else {
            Ok(LockCheck::Rejected {
                message: response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "Invalid password".to_string()),
            })
        }
    }
}
