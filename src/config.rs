use crate::error::ConfigError;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// PDF 处理服务地址
    pub api_base_url: String,
    /// 集合中最多允许的文件数
    pub max_files: usize,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 会话清单 (TOML) 路径
    pub manifest_path: String,
    /// 没有清单时扫描的 PDF 目录
    pub input_folder: String,
    /// 输出目录
    pub output_dir: String,
    /// 遇到 423 后最多提交几次
    pub max_submit_attempts: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            max_files: 150,
            request_timeout_secs: 60,
            manifest_path: "session.toml".to_string(),
            input_folder: "input_pdfs".to_string(),
            output_dir: "output".to_string(),
            max_submit_attempts: 2,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("PDF_API_BASE_URL").unwrap_or(default.api_base_url),
            max_files: std::env::var("MAX_FILES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_files),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            manifest_path: std::env::var("SESSION_MANIFEST").unwrap_or(default.manifest_path),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            max_submit_attempts: std::env::var("MAX_SUBMIT_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_submit_attempts),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "不能为空".to_string(),
            });
        }
        if self.max_files == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_files",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
