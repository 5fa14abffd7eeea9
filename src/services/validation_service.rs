//! 完整性校验服务 - 业务能力层
//!
//! 只负责"校验一批新加入的文件"，不关心集合里的其他文件。
//! 没能拿到响应时，整批文件都按损坏处理：问不到不等于没问题。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::PdfApi;
use crate::error::ApiError;
use crate::models::{BrokenKind, BrokenReason, DocumentHandle, ValidationReport};
use crate::store::{CollectionState, DocumentTicket};

/// 一批文件的校验结论，`None` 表示通过
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub verdicts: Vec<(String, Option<BrokenReason>)>,
    pub transport_failed: bool,
}

impl ValidationOutcome {
    pub fn broken_count(&self) -> usize {
        self.verdicts.iter().filter(|(_, r)| r.is_some()).count()
    }

    /// 写回集合
    ///
    /// 只写入仍然存活且批次号一致的条目，已删除（或删除后重新加入）的文件直接丢弃。
    ///
    /// # 返回
    /// 实际被标记为损坏的文件数
    pub fn apply_to(&self, state: &mut CollectionState, tickets: &[DocumentTicket]) -> usize {
        let mut applied = 0;
        for (name, reason) in &self.verdicts {
            let Some(reason) = reason else { continue };
            let Some(ticket) = tickets.iter().find(|t| &t.name == name) else {
                continue;
            };
            if state.apply_broken(ticket, reason.clone()) {
                applied += 1;
            } else {
                debug!("[{}] 校验结果已过期，丢弃", name);
            }
        }
        applied
    }
}

/// 完整性校验服务
pub struct ValidationService<A> {
    api: Arc<A>,
}

impl<A: PdfApi> ValidationService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// 一次请求校验整批文件
    ///
    /// 永远不会返回错误：传输失败会变成每个文件的连接错误。
    pub async fn validate_batch(&self, documents: &[DocumentHandle]) -> ValidationOutcome {
        if documents.is_empty() {
            return ValidationOutcome {
                verdicts: Vec::new(),
                transport_failed: false,
            };
        }

        match self.api.validate(documents).await {
            Ok(report) => ValidationOutcome {
                verdicts: classify(&report, documents),
                transport_failed: false,
            },
            Err(e) if e.is_transport() => {
                warn!("⚠️ 校验请求失败，{} 个文件按连接错误处理: {}", documents.len(), e);
                ValidationOutcome {
                    verdicts: all_broken(documents, BrokenReason::connection),
                    transport_failed: true,
                }
            }
            Err(e) => {
                warn!("⚠️ 校验接口返回错误: {}", e);
                let message = match &e {
                    ApiError::BadResponse {
                        message: Some(message),
                        ..
                    } => message.clone(),
                    _ => "Unknown error".to_string(),
                };
                ValidationOutcome {
                    verdicts: all_broken(documents, || BrokenReason {
                        kind: BrokenKind::MissingVerdict,
                        message: message.clone(),
                    }),
                    transport_failed: false,
                }
            }
        }
    }
}

/// 把服务端的响应映射到每个提交的文件；响应里缺失的文件视为失败
pub fn classify(report: &ValidationReport, documents: &[DocumentHandle]) -> Vec<(String, Option<BrokenReason>)> {
    documents
        .iter()
        .map(|doc| {
            let reason = match report.get(doc.name()) {
                Some(verdict) if verdict.ok => None,
                Some(verdict) => {
                    let error_type = verdict
                        .error_type
                        .as_deref()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string);
                    let message = verdict
                        .error
                        .as_deref()
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .unwrap_or("Unknown error");
                    Some(BrokenReason::rejected(error_type, message))
                }
                None => Some(BrokenReason::missing()),
            };
            (doc.name().to_string(), reason)
        })
        .collect()
}

fn all_broken(
    documents: &[DocumentHandle],
    reason: impl Fn() -> BrokenReason,
) -> Vec<(String, Option<BrokenReason>)> {
    documents
        .iter()
        .map(|doc| (doc.name().to_string(), Some(reason())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationVerdict;

    fn doc(name: &str) -> DocumentHandle {
        DocumentHandle::new(name, b"%PDF-1.7".to_vec())
    }

    #[test]
    fn test_classify_ok_rejected_and_missing() {
        let mut report = ValidationReport::new();
        report.insert("x.pdf".to_string(), ValidationVerdict::ok());
        report.insert(
            "y.pdf".to_string(),
            ValidationVerdict::rejected(Some("invalid_format  "), " Not a generic PDF."),
        );

        let verdicts = classify(&report, &[doc("x.pdf"), doc("y.pdf"), doc("z.pdf")]);

        assert_eq!(verdicts[0], ("x.pdf".to_string(), None));
        let y = verdicts[1].1.as_ref().unwrap();
        assert_eq!(y.to_string(), "invalid_format: Not a generic PDF.");
        let z = verdicts[2].1.as_ref().unwrap();
        assert_eq!(z.kind, BrokenKind::MissingVerdict);
    }

    #[test]
    fn test_apply_skips_removed_documents() {
        let mut state = CollectionState::new(5);
        let tickets = state.add(vec![doc("x.pdf"), doc("y.pdf")]).unwrap();
        state.remove("y.pdf").unwrap();

        let outcome = ValidationOutcome {
            verdicts: all_broken(&[doc("x.pdf"), doc("y.pdf")], BrokenReason::connection),
            transport_failed: true,
        };

        assert_eq!(outcome.apply_to(&mut state, &tickets), 1);
        assert_eq!(state.broken_names(), vec!["x.pdf"]);
        assert!(!state.contains("y.pdf"));
    }
}
