//! Cloud Vision 文字检测（REST）

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use redact_core::{OcrAnnotation, OcrError, OcrProvider};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com";

/// Vision 客户端配置
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    /// 服务地址，不含路径
    pub endpoint: Option<String>,
}

impl VisionConfig {
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

pub struct VisionClient {
    config: VisionConfig,
    http: reqwest::blocking::Client,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            http: reqwest::blocking::Client::new(),
        }
    }

    fn annotate_url(&self) -> String {
        format!(
            "{}/v1/images:annotate",
            self.config.endpoint_or_default().trim_end_matches('/')
        )
    }
}

impl OcrProvider for VisionClient {
    fn annotate(&mut self, image_path: &Path) -> Result<Vec<OcrAnnotation>, OcrError> {
        let start = Instant::now();
        let bytes = std::fs::read(image_path)?;
        log::info!(
            "[Vision] 提交文字检测: {} ({} 字节)",
            image_path.display(),
            bytes.len()
        );

        let response = self
            .http
            .post(self.annotate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&build_annotate_body(&bytes))
            .send()
            .map_err(|e| OcrError::Http(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| OcrError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(OcrError::Http(format!("状态码 {}: {}", status, body)));
        }

        let annotations = parse_annotate_response(&body)?;
        log::info!(
            "[Vision] 检测完成，耗时: {} ms，标注数: {}",
            start.elapsed().as_millis(),
            annotations.len()
        );
        Ok(annotations)
    }

    fn name(&self) -> &str {
        "vision"
    }
}

/// 构造 `images:annotate` 请求体
pub fn build_annotate_body(image: &[u8]) -> Value {
    json!({
        "requests": [{
            "image": { "content": STANDARD.encode(image) },
            "features": [{ "type": "TEXT_DETECTION" }]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<OcrAnnotation>,
    #[serde(default)]
    error: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// 解析 `images:annotate` 响应
///
/// 只取第一张图片的结果；没有文字时返回空列表。
pub fn parse_annotate_response(body: &str) -> Result<Vec<OcrAnnotation>, OcrError> {
    let response: AnnotateResponse = serde_json::from_str(body)?;
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(status) = first.error {
        return Err(OcrError::Service {
            code: status.code,
            message: status.message,
        });
    }
    Ok(first.text_annotations)
}
