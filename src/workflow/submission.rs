//! 提交流程 - 流程层
//!
//! 核心职责：定义"一次提交"的完整过程
//!
//! 流程顺序：
//! 1. 就绪检查（本地，不通过则不发请求）
//! 2. 构造请求：完整有序文件列表 + 已验证密码 + 非零旋转
//! 3. 发送并把结果归类为 成功 / 可恢复(423) / 失败
//!
//! 不持有集合状态，状态的修改由编排层完成。

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::PdfApi;
use crate::error::{ApiError, CollectionError};
use crate::models::{TransformOutput, TransformRequest};
use crate::store::CollectionState;
use crate::workflow::Transform;

/// 没能连上服务时展示给用户的信息
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error to server";
/// 服务端没有给出错误信息时的兜底
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 转换完成，集合应当清空
    Succeeded(TransformOutput),
    /// 423：服务端报告的加密文件
    Recoverable {
        /// 集合中存在的文件
        locked: Vec<String>,
        /// 集合中找不到的文件名，只用于提示
        unattributed: Vec<String>,
    },
    /// 其他失败，集合保持不变
    Failed { message: String },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }
}

/// 单次提交流程
///
/// - 只负责"检查 → 构造 → 发送 → 归类"
/// - 不重试，每次提交都是一次完整的新请求
pub struct SubmissionWorkflow<A> {
    api: Arc<A>,
}

impl<A: PdfApi> SubmissionWorkflow<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// 发送已构造好的请求并归类结果
    pub async fn execute(&self, request: &TransformRequest) -> SubmitOutcome {
        info!("📤 提交 {} 个文件到 {}", request.documents.len(), request.endpoint);
        let result = self.api.transform(request).await;
        interpret(result)
    }
}

/// 检查就绪状态并构造请求
///
/// # 参数
/// - `state`: 当前集合快照
/// - `transform`: 要执行的工具
///
/// # 返回
/// 不满足条件时返回本地错误，不会产生任何网络请求
pub fn prepare(state: &CollectionState, transform: &Transform) -> Result<TransformRequest, CollectionError> {
    if state.is_empty() {
        return Err(CollectionError::Empty);
    }

    if !state.is_ready() {
        return Err(CollectionError::NotReady {
            blocking: state.blocking_reasons().len(),
        });
    }

    if !transform.accepts_batch() && state.len() != 1 {
        return Err(CollectionError::WrongDocumentCount {
            tool: transform.name(),
            expected: 1,
            actual: state.len(),
        });
    }

    let documents = state.documents().to_vec();
    let mut passwords = BTreeMap::new();
    let mut rotations = BTreeMap::new();
    for doc in &documents {
        let Some(entry) = state.entry(doc.name()) else {
            continue;
        };
        if let Some(password) = entry.verified_password() {
            passwords.insert(doc.name().to_string(), password.to_string());
        }
        if !entry.rotation.is_zero() {
            rotations.insert(doc.name().to_string(), entry.rotation.degrees());
        }
    }

    let first = documents.first().map(|d| d.name()).unwrap_or_default();
    let mut fields = transform.form_fields();
    if matches!(transform, Transform::Unlock) {
        // /unlock-pdf 只读单个 password 字段
        if let Some(password) = passwords.get(first) {
            fields.push(("password", password.clone()));
        }
    }
    Ok(TransformRequest {
        endpoint: transform.endpoint(),
        file_field: transform.file_field(),
        default_file_name: transform.default_output_name(first),
        fields,
        documents,
        passwords,
        rotations,
    })
}

/// 把接口结果映射为提交结果
///
/// 423 之外的失败都是终态失败：优先展示服务端的原话，连接失败给出通用提示。
/// 此时 `Recoverable.unattributed` 为空，对照集合后才能区分。
pub fn interpret(result: Result<TransformOutput, ApiError>) -> SubmitOutcome {
    match result {
        Ok(output) => {
            info!("✅ 转换完成: {} ({} 字节)", output.file_name, output.content.len());
            SubmitOutcome::Succeeded(output)
        }
        Err(ApiError::Locked { names }) => {
            warn!("🔒 服务端报告 {} 个加密文件: {:?}", names.len(), names);
            SubmitOutcome::Recoverable {
                locked: names,
                unattributed: Vec::new(),
            }
        }
        Err(e) if e.is_transport() => {
            error!("❌ 提交失败（连接错误）: {}", e);
            SubmitOutcome::Failed {
                message: CONNECTION_ERROR_MESSAGE.to_string(),
            }
        }
        Err(e) => {
            error!("❌ 提交失败: {}", e);
            let message = match e {
                ApiError::BadResponse {
                    message: Some(message),
                    ..
                } => message,
                _ => UNKNOWN_SERVER_ERROR.to_string(),
            };
            SubmitOutcome::Failed { message }
        }
    }
}

/// 把 423 的文件名并入集合，返回对照后的结果
pub fn apply_locked(state: &mut CollectionState, names: Vec<String>) -> SubmitOutcome {
    let unattributed = state.union_locked(&names);
    if !unattributed.is_empty() {
        warn!("⚠️ 以下加密文件不在当前集合中: {:?}", unattributed);
    }
    let locked = names
        .into_iter()
        .filter(|n| state.contains(n))
        .collect();
    SubmitOutcome::Recoverable { locked, unattributed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrokenReason, DocumentHandle, Rotation};
    use crate::workflow::CompressionLevel;

    fn state_with(names: &[&str]) -> CollectionState {
        let mut state = CollectionState::new(10);
        state
            .add(names.iter().map(|n| DocumentHandle::new(*n, b"%PDF".to_vec())).collect())
            .unwrap();
        state
    }

    #[test]
    fn test_prepare_refuses_empty_collection() {
        let state = CollectionState::new(10);
        assert_eq!(
            prepare(&state, &Transform::Merge),
            Err(CollectionError::Empty)
        );
    }

    #[test]
    fn test_prepare_refuses_blocked_collection() {
        let mut state = state_with(&["a.pdf", "b.pdf"]);
        state.mark_broken("a.pdf", BrokenReason::missing());
        state.set_password("b.pdf", "pw").unwrap();

        let err = prepare(&state, &Transform::Merge)
            .unwrap_err();
        assert_eq!(err, CollectionError::NotReady { blocking: 2 });
    }

    #[test]
    fn test_prepare_sends_only_verified_passwords_and_nonzero_rotations() {
        let mut state = state_with(&["a.pdf", "b.pdf", "c.pdf"]);
        state.set_password("b.pdf", "secret").unwrap();
        state.mark_verified("b.pdf").unwrap();
        state.set_rotation("c.pdf", Rotation::from_degrees(270).unwrap()).unwrap();
        state.move_document(2, 0).unwrap();

        let request = prepare(&state, &Transform::Merge)
            .unwrap();

        assert_eq!(request.document_names(), vec!["c.pdf", "a.pdf", "b.pdf"]);
        assert_eq!(request.passwords_json(), r#"{"b.pdf":"secret"}"#);
        assert_eq!(request.rotations_json(), r#"{"c.pdf":270}"#);
        assert_eq!(request.endpoint, "/merge");
        assert_eq!(request.default_file_name, "merged.pdf");
    }

    #[test]
    fn test_prepare_single_document_tools() {
        let state = state_with(&["a.pdf", "b.pdf"]);
        let compress = Transform::Compress {
            level: CompressionLevel::Less,
        };
        assert!(matches!(
            prepare(&state, &compress),
            Err(CollectionError::WrongDocumentCount { actual: 2, .. })
        ));

        let state = state_with(&["a.pdf"]);
        let request = prepare(&state, &compress).unwrap();
        assert_eq!(request.file_field, "file");
        assert_eq!(request.fields, vec![("level", "less".to_string())]);
    }

    #[test]
    fn test_prepare_unlock_sends_verified_password_field() {
        let mut state = state_with(&["a.pdf"]);
        state.set_password("a.pdf", "secret").unwrap();
        state.mark_verified("a.pdf").unwrap();

        let request = prepare(&state, &Transform::Unlock).unwrap();

        assert_eq!(request.endpoint, "/unlock-pdf");
        assert_eq!(request.file_field, "file");
        assert_eq!(request.fields, vec![("password", "secret".to_string())]);
        assert_eq!(request.default_file_name, "unlocked_a.pdf");
    }

    #[test]
    fn test_interpret_failures() {
        let outcome = interpret(Err(ApiError::Timeout {
            endpoint: "/merge".to_string(),
        }));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: CONNECTION_ERROR_MESSAGE.to_string()
            }
        );

        let outcome = interpret(Err(ApiError::BadResponse {
            endpoint: "/merge".to_string(),
            status: 500,
            message: Some("Operation failed: boom".to_string()),
        }));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Operation failed: boom".to_string()
            }
        );

        let outcome = interpret(Err(ApiError::BadResponse {
            endpoint: "/merge".to_string(),
            status: 400,
            message: None,
        }));
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: UNKNOWN_SERVER_ERROR.to_string()
            }
        );
    }

    #[test]
    fn test_apply_locked_unions_and_reports_strangers() {
        let mut state = state_with(&["a.pdf", "b.pdf", "c.pdf"]);
        state.mark_locked("b.pdf");
        state.mark_locked("c.pdf");

        let outcome = apply_locked(
            &mut state,
            vec!["a.pdf".to_string(), "b.pdf".to_string(), "ghost.pdf".to_string()],
        );

        assert_eq!(state.locked_names(), vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(
            outcome,
            SubmitOutcome::Recoverable {
                locked: vec!["a.pdf".to_string(), "b.pdf".to_string()],
                unattributed: vec!["ghost.pdf".to_string()],
            }
        );
        assert!(!state.contains("ghost.pdf"));
    }
}
