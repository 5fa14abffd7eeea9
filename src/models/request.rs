//! 转换请求

use super::document::DocumentHandle;
use std::collections::BTreeMap;

/// 发往服务端的完整转换请求
///
/// 每次提交都重新构造，不存在断点续传。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    pub endpoint: &'static str,
    /// multipart 文件字段名（"files" 或 "file"）
    pub file_field: &'static str,
    /// 按输出顺序排列
    pub documents: Vec<DocumentHandle>,
    /// 只包含已验证的密码
    pub passwords: BTreeMap<String, String>,
    /// 只包含非零旋转
    pub rotations: BTreeMap<String, u16>,
    pub fields: Vec<(&'static str, String)>,
    pub default_file_name: String,
}

impl TransformRequest {
    pub fn passwords_json(&self) -> String {
        serde_json::to_string(&self.passwords).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn rotations_json(&self) -> String {
        serde_json::to_string(&self.rotations).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn document_names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name()).collect()
    }
}
