use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档集合相关错误
    #[error("集合错误: {0}")]
    Collection(#[from] CollectionError),
    /// 远程服务调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 预览渲染错误
    #[error(transparent)]
    Preview(#[from] crate::services::PreviewError),
}

/// 文档集合错误
///
/// 全部由本地状态决定，不涉及网络。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// 本次添加会超过上限，整批拒绝
    #[error("最多只能选择 {max} 个文件 (当前 {current} 个, 新增 {requested} 个)")]
    CapacityExceeded {
        max: usize,
        current: usize,
        requested: usize,
    },
    /// 文档不在集合中
    #[error("文档不存在: {name}")]
    NotFound { name: String },
    /// 排序参数不合法
    #[error("排序无效: {reason}")]
    InvalidOrder { reason: String },
    /// 集合未满足提交条件
    #[error("集合尚未就绪，无法提交 ({blocking} 个文件阻塞)")]
    NotReady { blocking: usize },
    /// 集合为空
    #[error("集合为空")]
    Empty,
    /// 单文件工具收到了多个文件
    #[error("{tool} 只接受 {expected} 个文件，当前 {actual} 个")]
    WrongDocumentCount {
        tool: &'static str,
        expected: usize,
        actual: usize,
    },
    /// 已有一次提交正在进行
    #[error("已有提交正在进行中")]
    SubmissionInFlight,
    /// 密码校验未通过
    #[error("密码错误 ({name}): {message}")]
    PasswordRejected { name: String, message: String },
}

/// 远程服务调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（没有拿到任何响应）
    #[error("请求失败 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },
    /// 请求超时
    #[error("请求超时 ({endpoint})")]
    Timeout { endpoint: String },
    /// 423: 存在未解锁的文档
    #[error("存在加密文件: {names:?}")]
    Locked { names: Vec<String> },
    /// 服务返回错误状态码
    #[error("服务返回错误 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// 是否属于"没能问到服务"的错误
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Timeout { .. })
    }

    /// 从 reqwest 错误构造
    pub fn from_reqwest(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if err.is_timeout() {
            ApiError::Timeout { endpoint }
        } else {
            ApiError::Transport {
                endpoint,
                message: err.to_string(),
            }
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: String::new(),
            source: err,
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err.url().map(|u| u.path().to_string()).unwrap_or_default();
        AppError::Api(ApiError::from_reqwest(endpoint, err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let timeout = ApiError::Timeout {
            endpoint: "/validate-pdf".to_string(),
        };
        let locked = ApiError::Locked {
            names: vec!["a.pdf".to_string()],
        };
        assert!(timeout.is_transport());
        assert!(!locked.is_transport());
    }

    #[test]
    fn test_collection_error_wraps_into_app_error() {
        let err: AppError = CollectionError::Empty.into();
        assert!(matches!(err, AppError::Collection(CollectionError::Empty)));
    }
}
