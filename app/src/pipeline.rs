//! 脱敏流水线
//!
//! OCR → 片段提取 → 敏感文本分类 → 遮盖渲染 → 写出文件，严格顺序执行。
//! 任一步失败都直接返回错误，不会写出输出文件。

use crate::config::AppConfig;
use redact_classify::{GeminiClassifier, GeminiConfig};
use redact_core::{
    classify_texts, extract_spans, ClassificationError, Classifier, OcrError, OcrProvider,
};
use redact_ocr::{OcrEngineType, TesseractConfig, TesseractEngine, VisionClient, VisionConfig};
use redact_render::{encode_png, open_image, render_masks, RenderError};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 一次成功运行的摘要
#[derive(Debug, Clone)]
pub struct RedactionReport {
    pub output_path: PathBuf,
    /// 参与分类的片段数（不含整页汇总）
    pub span_count: usize,
    /// 模型返回的敏感文本数
    pub sensitive_count: usize,
    /// 实际遮盖的区域数
    pub masked_count: usize,
}

pub struct Pipeline {
    ocr: Box<dyn OcrProvider>,
    classifier: Box<dyn Classifier>,
}

impl Pipeline {
    pub fn new(ocr: Box<dyn OcrProvider>, classifier: Box<dyn Classifier>) -> Self {
        Self { ocr, classifier }
    }

    /// 按配置构造真实的 OCR 与分类客户端
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let ocr: Box<dyn OcrProvider> = match config.ocr_engine {
            OcrEngineType::Vision => Box::new(VisionClient::new(VisionConfig {
                api_key: config.vision_api_key_or_default().to_string(),
                endpoint: None,
            })),
            OcrEngineType::Tesseract => Box::new(TesseractEngine::new(TesseractConfig {
                binary_path: config.tesseract_binary.clone(),
                lang: config.tesseract_lang.clone(),
                ..Default::default()
            })?),
        };

        let classifier = Box::new(GeminiClassifier::new(GeminiConfig {
            api_key: config.api_key.clone(),
            model: config.gemini_model.clone(),
            endpoint: None,
        }));

        log::info!(
            "[Pipeline] OCR 引擎: {}，分类模型: {}",
            ocr.name(),
            classifier.name()
        );
        Ok(Self::new(ocr, classifier))
    }

    pub fn run(&mut self, config: &AppConfig) -> Result<RedactionReport, PipelineError> {
        let start = Instant::now();

        let annotations = self.ocr.annotate(&config.input_path)?;
        let spans = extract_spans(&annotations);
        log::info!(
            "[Pipeline] 提取文本片段 {} 个: {:?}",
            spans.len(),
            spans.iter().map(|s| s.text.as_str()).collect::<Vec<_>>()
        );

        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        let sensitive = classify_texts(self.classifier.as_ref(), texts.as_slice())?;
        log::info!(
            "[Pipeline] 待遮盖文本: {:?}",
            sensitive.iter().collect::<Vec<_>>()
        );

        let source = open_image(&config.input_path)?;
        let masked = render_masks(&source, &spans, &sensitive);
        let bytes = encode_png(&masked.image)?;

        std::fs::write(&config.output_path, bytes).map_err(|source| PipelineError::Write {
            path: config.output_path.clone(),
            source,
        })?;

        log::info!(
            "[Pipeline] 已保存 {}，耗时: {} ms",
            config.output_path.display(),
            start.elapsed().as_millis()
        );

        Ok(RedactionReport {
            output_path: config.output_path.clone(),
            span_count: spans.len(),
            sensitive_count: sensitive.len(),
            masked_count: masked.masked,
        })
    }
}
