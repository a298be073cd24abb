//! Tesseract OCR 引擎实现（CLI 包装）

use redact_core::{OcrAnnotation, OcrError, OcrProvider, Vertex};
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// 页面分割模式 11：稀疏文字，适合截图
const SPARSE_TEXT_PSM: &str = "11";

/// TSV 中单词行的 level
const WORD_LEVEL: &str = "5";

#[derive(Debug, Clone, Default)]
pub struct TesseractConfig {
    /// 可执行文件路径，默认从 PATH 查找 `tesseract`
    pub binary_path: Option<String>,
    /// 语言（如 "eng"、"chi_sim+eng"）
    pub lang: Option<String>,
}

impl TesseractConfig {
    pub fn binary_or_default(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("tesseract")
    }

    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or("eng")
    }
}

/// Tesseract OCR 引擎
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    /// 创建引擎前先运行一次 `--version`，确认可执行文件存在
    pub fn new(config: TesseractConfig) -> Result<Self, OcrError> {
        let version = detect_version(config.binary_or_default())?;
        log::info!(
            "[Tesseract] {} 可用，版本: {}",
            config.binary_or_default(),
            version.as_deref().unwrap_or("unknown")
        );
        Ok(Self { config })
    }
}

impl OcrProvider for TesseractEngine {
    fn annotate(&mut self, image_path: &Path) -> Result<Vec<OcrAnnotation>, OcrError> {
        let start = Instant::now();
        let binary = self.config.binary_or_default();
        let lang = self.config.lang_or_default();
        log::info!("[Tesseract] 识别 {} (lang={})", image_path.display(), lang);

        let output = Command::new(binary)
            .arg(image_path)
            .args(["stdout", "-l", lang, "--psm", SPARSE_TEXT_PSM, "tsv"])
            .output()
            .map_err(|e| OcrError::Command(format!("无法启动 {}: {}", binary, e)))?;

        if !output.status.success() {
            return Err(OcrError::Command(format!(
                "{} 退出码 {:?}: {}",
                binary,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let annotations = parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout));
        log::info!(
            "[Tesseract] 识别完成，耗时: {} ms，单词数: {}",
            start.elapsed().as_millis(),
            annotations.len() - 1
        );
        Ok(annotations)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// 将 Tesseract TSV 输出转换为与 Vision 相同形状的标注列表
///
/// 第一条是整页汇总（所有单词以空格拼接，无多边形），之后每个单词一条，
/// 多边形为左上、右上、右下、左下四个像素顶点。
pub fn parse_tesseract_tsv(tsv: &str) -> Vec<OcrAnnotation> {
    let words: Vec<OcrAnnotation> = tsv.lines().skip(1).filter_map(parse_word_row).collect();

    let page_text = words
        .iter()
        .filter_map(|w| w.description.as_deref())
        .collect::<Vec<_>>()
        .join(" ");

    std::iter::once(OcrAnnotation::text_only(page_text))
        .chain(words)
        .collect()
}

/// 解析单行 TSV，非单词行、空文本和负置信度返回 `None`
///
/// 列顺序: level page block par line word left top width height conf text
fn parse_word_row(row: &str) -> Option<OcrAnnotation> {
    let cols: Vec<&str> = row.split('\t').collect();
    let [level, _, _, _, _, _, left, top, width, height, conf, text, ..] = cols.as_slice() else {
        return None;
    };

    let text = text.trim();
    if *level != WORD_LEVEL || text.is_empty() || conf.parse::<f32>().map_or(true, |c| c < 0.0) {
        return None;
    }

    let num = |s: &str| s.parse::<i32>().unwrap_or(0);
    let (x0, y0) = (num(*left), num(*top));
    let (x1, y1) = (x0 + num(*width), y0 + num(*height));
    Some(OcrAnnotation::new(
        text,
        vec![
            Vertex::new(x0, y0),
            Vertex::new(x1, y0),
            Vertex::new(x1, y1),
            Vertex::new(x0, y1),
        ],
    ))
}

/// 运行 `<binary> --version` 并读取版本号，无法识别版本时返回 `Ok(None)`
pub fn detect_version(binary: &str) -> Result<Option<String>, OcrError> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| OcrError::Command(format!("无法启动 {}: {}", binary, e)))?;

    if !output.status.success() {
        return Err(OcrError::Command(format!("{} --version 失败", binary)));
    }

    // 部分版本把 banner 打到 stderr
    let banner = [output.stdout, output.stderr].concat();
    Ok(version_from_banner(&String::from_utf8_lossy(&banner)))
}

/// 从 "tesseract 5.3.0" / "tesseract v4.1.1" 一类的行里取出版本号
fn version_from_banner(banner: &str) -> Option<String> {
    banner.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("tesseract"), Some(v)) => Some(v.trim_start_matches('v').to_string()),
            _ => None,
        }
    })
}
