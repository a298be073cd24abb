//! OCR 提供方实现
//!
//! - Cloud Vision（REST，`TEXT_DETECTION`）
//! - Tesseract（CLI，TSV 输出）
//!
//! 两者都满足 [`OcrProvider`] 的约定：第一条是整页汇总，其后为带像素多边形的文字。

mod tesseract;
mod vision;

pub use redact_core::{OcrError, OcrProvider};
pub use tesseract::{detect_version, parse_tesseract_tsv, TesseractConfig, TesseractEngine};
pub use vision::{build_annotate_body, parse_annotate_response, VisionClient, VisionConfig};

use serde::{Deserialize, Serialize};

/// OCR 引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineType {
    /// Google Cloud Vision
    #[default]
    Vision,
    /// Tesseract OCR (CLI)
    Tesseract,
}

impl std::fmt::Display for OcrEngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrEngineType::Vision => write!(f, "vision"),
            OcrEngineType::Tesseract => write!(f, "tesseract"),
        }
    }
}

impl std::str::FromStr for OcrEngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vision" => Ok(OcrEngineType::Vision),
            "tesseract" => Ok(OcrEngineType::Tesseract),
            other => Err(format!("unknown OCR engine: {}", other)),
        }
    }
}
