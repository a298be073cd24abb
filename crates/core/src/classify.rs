//! 敏感文本分类
//!
//! 构造发给外部分类模型的请求（上下文 + 固定策略 + 输出 schema），
//! 并把模型回复解析为敏感文本集合。分类判断完全交给模型，这里不做复核。

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use thiserror::Error;

/// 包含此子串的文本一律视为敏感
pub const SENSITIVE_MARKER: &str = "mii";

/// 固定的敏感信息判定规则
pub const CLASSIFICATION_POLICY: &str = "\
1. API keys: long strings mixing letters and digits.
2. Email addresses: strings containing '@'.
3. Phone numbers: digits separated by '-' (e.g. \"123-456-7890\").
4. Credit card numbers: 16-digit numbers.
5. Personal names: anything that is clearly a person's name.
6. Company, product or service names: one or more words, possibly with symbols such as '-' or '.', or mixed scripts, that name a specific brand, company or project in context. Common words such as 'project', 'dashboard' or 'add' are not names.
7. Any string containing the following:
   - mii";

/// 上下文分隔符
const CONTEXT_SEPARATOR: &str = ", ";

/// 回复中的字段名
const SENSITIVE_TEXTS_FIELD: &str = "sensitiveTexts";

#[derive(Debug, Error)]
pub enum ClassificationError {
    /// 请求未完成（网络、HTTP 状态、响应结构）
    #[error("classification request failed: {0}")]
    Transport(String),

    /// 回复不是预期的 JSON
    #[error("classification reply is not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),
}

/// 敏感文本集合
///
/// 成员判断是精确、区分大小写的字符串相等，不做任何归一化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveSet {
    texts: HashSet<String>,
}

impl SensitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SensitiveSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            texts: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// 发给分类模型的请求
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    /// 按顺序拼接的文本上下文
    pub context: String,
    /// 嵌入了上下文的完整提示词
    pub prompt: String,
    /// 结构化输出 schema
    pub schema: Value,
}

impl ClassificationRequest {
    pub fn new<S: AsRef<str>>(texts: &[S]) -> Self {
        let context = join_context(texts);
        let prompt = build_prompt(&context);
        Self {
            context,
            prompt,
            schema: response_schema(),
        }
    }
}

/// 外部分类模型
///
/// 只负责把请求送出去并拿回一段文本，解析在 [`parse_reply`] 中完成。
pub trait Classifier {
    fn generate(&self, request: &ClassificationRequest) -> Result<String, ClassificationError>;

    fn name(&self) -> &str;
}

/// 按顺序用 `", "` 拼接文本
pub fn join_context<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn build_prompt(context: &str) -> String {
    format!(
        "From the following texts, identify any information that should be hidden before the image is published. \
Treat the following as sensitive:\n{policy}\n\n\
Return the texts to hide as JSON.\n\
Format: {{ \"{field}\": [\"text to hide 1\", \"text to hide 2\"] }}\n\
Text context: {context}",
        policy = CLASSIFICATION_POLICY,
        field = SENSITIVE_TEXTS_FIELD,
        context = context,
    )
}

/// 结构化输出 schema：`{ sensitiveTexts: string[] }`
pub fn response_schema() -> Value {
    json!({
        "description": "List of sensitive texts",
        "type": "OBJECT",
        "properties": {
            SENSITIVE_TEXTS_FIELD: {
                "type": "ARRAY",
                "description": "Array of sensitive text strings",
                "items": { "type": "STRING" }
            }
        },
        "required": [SENSITIVE_TEXTS_FIELD]
    })
}

#[derive(Debug, Deserialize)]
struct ClassificationReply {
    #[serde(rename = "sensitiveTexts")]
    sensitive_texts: Vec<String>,
}

/// 解析模型回复
pub fn parse_reply(reply: &str) -> Result<SensitiveSet, ClassificationError> {
    let parsed: ClassificationReply = serde_json::from_str(reply)?;
    Ok(parsed.sensitive_texts.into_iter().collect())
}

/// 构造请求、调用分类模型并解析结果
pub fn classify_texts<S: AsRef<str>>(
    classifier: &dyn Classifier,
    texts: &[S],
) -> Result<SensitiveSet, ClassificationError> {
    let request = ClassificationRequest::new(texts);
    log::info!(
        "[Classify] 提交 {} 段文本到 {}",
        texts.len(),
        classifier.name()
    );

    let reply = classifier.generate(&request)?;
    log::debug!("[Classify] 模型回复: {}", reply);

    let set = parse_reply(&reply)?;
    log::info!("[Classify] 敏感文本 {} 条", set.len());
    Ok(set)
}
