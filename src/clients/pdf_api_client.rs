/// PDF 服务 HTTP 客户端
///
/// 所有接口都是 multipart 表单提交，封装在这里，上层不接触传输细节。
use crate::clients::PdfApi;
use crate::config::Config;
use crate::error::{ApiError, AppResult};
use crate::models::{
    parse_locked_names, DocumentHandle, PasswordCheckResponse, ServiceErrorBody, TransformOutput,
    TransformRequest, ValidationReport,
};
use crate::models::wire::HealthResponse;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

const VALIDATE_ENDPOINT: &str = "/validate-pdf";
const CHECK_PASSWORD_ENDPOINT: &str = "/check-password";
const HEALTH_ENDPOINT: &str = "/";

/// PDF 服务客户端
pub struct PdfApiClient {
    http: Client,
    base_url: String,
}

impl PdfApiClient {
    /// 按配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout())
    }

    /// 指定服务地址和超时创建客户端
    ///
    /// 超时同时作用于连接和整个请求；超时按传输失败处理。
    pub fn with_base_url(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送表单，非 2xx 一律转成 [`ApiError`]
    async fn post_form(&self, endpoint: &str, form: Form) -> Result<Response, ApiError> {
        let response = self
            .http
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(read_error(endpoint, response).await)
        }
    }

    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?;
        serde_json::from_slice(&body).map_err(|source| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PdfApi for PdfApiClient {
    async fn validate(&self, documents: &[DocumentHandle]) -> Result<ValidationReport, ApiError> {
        debug!("校验 {} 个文件", documents.len());

        let mut form = Form::new();
        for doc in documents {
            form = form.part("files", file_part(VALIDATE_ENDPOINT, doc)?);
        }

        let response = self.post_form(VALIDATE_ENDPOINT, form).await?;
        Self::read_json(VALIDATE_ENDPOINT, response).await
    }

    async fn check_password(
        &self,
        document: &DocumentHandle,
        password: Option<&str>,
    ) -> Result<PasswordCheckResponse, ApiError> {
        debug!("[{}] 检查密码 (附带密码: {})", document.name(), password.is_some());

        let mut form = Form::new().part("file", file_part(CHECK_PASSWORD_ENDPOINT, document)?);
        if let Some(password) = password {
            form = form.text("password", password.to_string());
        }

        let response = self.post_form(CHECK_PASSWORD_ENDPOINT, form).await?;
        Self::read_json(CHECK_PASSWORD_ENDPOINT, response).await
    }

    async fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, ApiError> {
        let endpoint = request.endpoint;
        debug!(
            "提交 {}: 文件 {:?}, 密码 {} 个, 旋转 {:?}",
            endpoint,
            request.document_names(),
            request.passwords.len(),
            request.rotations
        );

        let mut form = Form::new();
        for doc in &request.documents {
            form = form.part(request.file_field, file_part(endpoint, doc)?);
        }
        form = form
            .text("passwords", request.passwords_json())
            .text("rotations", request.rotations_json());
        for (key, value) in &request.fields {
            form = form.text(*key, value.clone());
        }

        let response = self.post_form(endpoint, form).await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| request.default_file_name.clone());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e))?
            .to_vec();

        Ok(TransformOutput {
            file_name,
            content,
            content_type,
        })
    }

    async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.url(HEALTH_ENDPOINT))
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(HEALTH_ENDPOINT, e))?;

        if !response.status().is_success() {
            return Err(read_error(HEALTH_ENDPOINT, response).await);
        }

        let health: HealthResponse = Self::read_json(HEALTH_ENDPOINT, response).await?;
        Ok(health.message)
    }
}

fn file_part(endpoint: &str, doc: &DocumentHandle) -> Result<Part, ApiError> {
    Part::bytes(doc.content().to_vec())
        .file_name(doc.name().to_string())
        .mime_str("application/pdf")
        .map_err(|e| ApiError::from_reqwest(endpoint, e))
}

/// 把失败响应转成错误
///
/// 423 的响应体按宽松规则解析出文件名列表；其他状态码取 `detail` / `error`。
async fn read_error(endpoint: &str, response: Response) -> ApiError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return ApiError::from_reqwest(endpoint, e),
    };

    if status == StatusCode::LOCKED {
        return ApiError::Locked {
            names: parse_locked_names(&body),
        };
    }

    let message = serde_json::from_slice::<ServiceErrorBody>(&body)
        .ok()
        .and_then(|b| b.message());

    ApiError::BadResponse {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    }
}

/// 从 `Content-Disposition` 中提取文件名，`filename*` 优先
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    static EXTENDED: OnceLock<Option<Regex>> = OnceLock::new();
    static PLAIN: OnceLock<Option<Regex>> = OnceLock::new();

    let extended = EXTENDED
        .get_or_init(|| Regex::new(r#"(?i)filename\*\s*=\s*(?:[\w-]+'[\w-]*')?"?([^";]+)"?"#).ok());
    let plain = PLAIN.get_or_init(|| Regex::new(r#"(?i)filename\s*=\s*"([^"]*)"|(?i)filename\s*=\s*([^;]+)"#).ok());

    if let Some(caps) = extended.as_ref().and_then(|re| re.captures(header)) {
        let name = percent_decode(caps.get(1)?.as_str().trim());
        if !name.is_empty() {
            return Some(name);
        }
    }

    let caps = plain.as_ref()?.captures(header)?;
    let name = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn percent_decode(input: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_plain_quoted() {
        assert_eq!(
            file_name_from_disposition(r#"attachment; filename="merged.pdf""#).as_deref(),
            Some("merged.pdf")
        );
    }

    #[test]
    fn test_disposition_unquoted() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=edited.pdf").as_deref(),
            Some("edited.pdf")
        );
    }

    #[test]
    fn test_disposition_extended_wins() {
        let header = r#"attachment; filename="fallback.pdf"; filename*=utf-8''%E5%90%88%E5%B9%B6.pdf"#;
        assert_eq!(file_name_from_disposition(header).as_deref(), Some("合并.pdf"));
    }

    #[test]
    fn test_disposition_missing_name() {
        assert_eq!(file_name_from_disposition("inline"), None);
    }

    #[test]
    fn test_percent_decode_passthrough() {
        assert_eq!(percent_decode("a%20b.pdf"), "a b.pdf");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = PdfApiClient::with_base_url("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/merge"), "http://localhost:8000/merge");
    }
}
