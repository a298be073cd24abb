use redact_ocr::OcrEngineType;
use serde::Serialize;
use std::path::PathBuf;

/// 默认输出文件（相对当前目录）
pub const DEFAULT_OUTPUT_PATH: &str = "output.png";

pub const ENV_API_KEY: &str = "GOOGLE_GENERATIVE_AI";
pub const ENV_FILE_NAME: &str = "FILE_NAME";
pub const ENV_OUTPUT_PATH: &str = "REDACT_OUTPUT_PATH";
pub const ENV_OCR_ENGINE: &str = "REDACT_OCR_ENGINE";
pub const ENV_VISION_API_KEY: &str = "GOOGLE_VISION_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "REDACT_GEMINI_MODEL";
pub const ENV_TESSERACT_BINARY: &str = "TESSERACT_BINARY";
pub const ENV_TESSERACT_LANG: &str = "TESSERACT_LANG";

/// 运行配置
///
/// 启动时从环境变量构造一次，之后显式传递，内部组件不再读取环境变量。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// 分类模型 API Key
    #[serde(skip_serializing)]
    pub api_key: String,
    /// 源图片路径
    pub input_path: PathBuf,
    /// 输出图片路径
    pub output_path: PathBuf,
    /// OCR 引擎
    pub ocr_engine: OcrEngineType,
    /// Vision API Key，未设置时使用 `api_key`
    #[serde(skip_serializing)]
    pub vision_api_key: Option<String>,
    /// 分类模型 ID
    pub gemini_model: Option<String>,
    pub tesseract_binary: Option<String>,
    pub tesseract_lang: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl AppConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_key = require(ENV_API_KEY)?;
        let input_path = PathBuf::from(require(ENV_FILE_NAME)?);

        let output_path = get(ENV_OUTPUT_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        let ocr_engine = match get(ENV_OCR_ENGINE) {
            Some(raw) => raw.parse::<OcrEngineType>().map_err(|reason| ConfigError::InvalidValue {
                name: ENV_OCR_ENGINE,
                reason,
            })?,
            None => OcrEngineType::default(),
        };

        Ok(Self {
            api_key,
            input_path,
            output_path,
            ocr_engine,
            vision_api_key: get(ENV_VISION_API_KEY),
            gemini_model: get(ENV_GEMINI_MODEL),
            tesseract_binary: get(ENV_TESSERACT_BINARY),
            tesseract_lang: get(ENV_TESSERACT_LANG),
        })
    }

    pub fn vision_api_key_or_default(&self) -> &str {
        self.vision_api_key.as_deref().unwrap_or(&self.api_key)
    }
}
