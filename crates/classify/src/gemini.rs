//! Gemini `generateContent` 客户端

use redact_core::{ClassificationError, ClassificationRequest, Classifier};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// 模型 ID，不带 `models/` 前缀
    pub model: Option<String>,
    /// 服务地址，不含路径
    pub endpoint: Option<String>,
}

impl GeminiConfig {
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .map(|m| m.trim_start_matches("models/"))
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

pub struct GeminiClassifier {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClassifier {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::blocking::Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint_or_default().trim_end_matches('/'),
            self.config.model_or_default()
        )
    }
}

impl Classifier for GeminiClassifier {
    fn generate(&self, request: &ClassificationRequest) -> Result<String, ClassificationError> {
        let start = Instant::now();

        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&build_generate_body(request))
            .send()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ClassificationError::Transport(format!(
                "status {}: {}",
                status, body
            )));
        }

        let text = extract_reply_text(&body)?;
        log::info!(
            "[Classify] {} 回复耗时: {} ms",
            self.config.model_or_default(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        self.config.model_or_default()
    }
}

/// 构造请求体，要求以 JSON 形式按 schema 输出
pub fn build_generate_body(request: &ClassificationRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// 取第一个候选的全部文本片段
///
/// 响应结构不符或没有候选视为请求未完成。
pub fn extract_reply_text(body: &str) -> Result<String, ClassificationError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ClassificationError::Transport(format!("unexpected response: {}", e)))?;

    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| ClassificationError::Transport("response has no candidates".to_string()))?;

    Ok(content.parts.into_iter().filter_map(|p| p.text).collect())
}
