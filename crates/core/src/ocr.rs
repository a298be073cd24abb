//! OCR 提供方接口

use crate::span::OcrAnnotation;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR 请求失败: {0}")]
    Http(String),

    #[error("OCR 服务返回错误 {code}: {message}")]
    Service { code: i32, message: String },

    #[error("OCR 响应解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("OCR 命令执行失败: {0}")]
    Command(String),
}

/// OCR 提供方统一 trait
///
/// 返回的列表第一条必须是整页文字汇总，其后每条对应一段文字及其多边形。
pub trait OcrProvider: Send {
    fn annotate(&mut self, image_path: &Path) -> Result<Vec<OcrAnnotation>, OcrError>;

    fn name(&self) -> &str;
}
