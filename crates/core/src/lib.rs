//! Core data model for image redaction tasks.
//!
//! OCR 输出 → 文本片段 → 敏感文本分类，渲染和编排由其它 crate 完成。

pub mod classify;
pub mod ocr;
pub mod span;

pub use classify::{
    classify_texts, join_context, parse_reply, response_schema, ClassificationError, ClassificationRequest,
    Classifier, SensitiveSet, CLASSIFICATION_POLICY, SENSITIVE_MARKER,
};
pub use ocr::{OcrError, OcrProvider};
pub use span::{extract_spans, BoundingPoly, OcrAnnotation, Point, TextSpan, Vertex};
