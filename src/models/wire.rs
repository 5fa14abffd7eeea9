//! 与 PDF 服务之间的数据格式
//!
//! 423 的响应体格式服务端并不统一：可能是 JSON 数组、包着数组的 JSON 字符串，
//! 也可能只是一个裸文件名。这里的宽松解析是协议的一部分，不是临时兼容。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 单个文件的校验结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ValidationVerdict {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn rejected(error_type: Option<&str>, error: &str) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            error_type: error_type.map(str::to_string),
        }
    }
}

/// 校验接口的响应：文件名 → 结果
pub type ValidationReport = HashMap<String, ValidationVerdict>;

/// 密码检查接口的响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCheckResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 服务端的结构化错误体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceErrorBody {
    /// 取出可读的错误信息，优先 `detail`
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        self.error.clone().filter(|e| !e.is_empty())
    }
}

/// 健康检查响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub message: String,
}

/// 转换成功后的产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub file_name: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

/// 解析 423 响应体中的加密文件列表
///
/// 依次尝试：JSON 数组、JSON 字符串（内部可能还是数组）、带 `detail` 的对象，
/// 都不是 JSON 时把整段文本当作一个文件名。空内容返回空列表。
pub fn parse_locked_names(body: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => names_from_value(&value),
        Err(_) => vec![text.to_string()],
    }
}

fn names_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => {
            let inner = s.trim();
            if inner.is_empty() {
                return Vec::new();
            }
            // detail 里常见的是序列化过一次的数组
            match serde_json::from_str::<Value>(inner) {
                Ok(nested @ Value::Array(_)) => names_from_value(&nested),
                _ => vec![inner.to_string()],
            }
        }
        Value::Object(map) => map
            .get("detail")
            .or_else(|| map.get("locked"))
            .or_else(|| map.get("error"))
            .map(names_from_value)
            .unwrap_or_default(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
