//! 文本片段提取
//!
//! 将 OCR 返回的原始标注列表整理为带多边形的文本片段序列。

use serde::{Deserialize, Serialize};

/// 像素坐标点（原图坐标系）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 文本片段
///
/// `polygon` 保持 OCR 给出的顶点顺序，渲染时按此顺序闭合填充，
/// 顺序错误会得到自相交的形状。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub polygon: Vec<Point>,
}

/// OCR 标注顶点，坐标分量可能缺失
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// 缺失的分量按 0 处理
    pub fn to_point(self) -> Point {
        Point::new(self.x.unwrap_or(0), self.y.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// OCR 原始标注
///
/// 字段命名与 Cloud Vision `textAnnotations` 一致，可直接反序列化。
/// 列表中的第一条是整页文字汇总。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrAnnotation {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_poly: Option<BoundingPoly>,
}

impl OcrAnnotation {
    pub fn new(description: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        Self {
            description: Some(description.into()),
            bounding_poly: Some(BoundingPoly { vertices }),
        }
    }

    /// 不带多边形的标注（如整页汇总）
    pub fn text_only(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            bounding_poly: None,
        }
    }
}

/// 从 OCR 标注中提取文本片段
///
/// - 丢弃第一条（整页汇总），无论内容
/// - 丢弃描述为空或缺失的标注
/// - 缺失的多边形视为空多边形，缺失的坐标视为 0
pub fn extract_spans(annotations: &[OcrAnnotation]) -> Vec<TextSpan> {
    annotations
        .iter()
        .skip(1)
        .filter_map(|annotation| {
            let text = annotation.description.as_deref().filter(|t| !t.is_empty())?;
            let polygon = annotation
                .bounding_poly
                .as_ref()
                .map(|poly| poly.vertices.iter().map(|v| v.to_point()).collect())
                .unwrap_or_default();
            Some(TextSpan {
                text: text.to_string(),
                polygon,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Vertex> {
        vec![
            Vertex::new(x0, y0),
            Vertex::new(x1, y0),
            Vertex::new(x1, y1),
            Vertex::new(x0, y1),
        ]
    }

    #[test]
    fn test_first_annotation_is_dropped() {
        let annotations = vec![
            OcrAnnotation::new("alice@example.com Dashboard", rect(0, 0, 30, 5)),
            OcrAnnotation::new("alice@example.com", rect(0, 0, 10, 5)),
            OcrAnnotation::new("Dashboard", rect(20, 0, 30, 5)),
        ];
        let spans = extract_spans(&annotations);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "alice@example.com");
        assert_eq!(spans[1].text, "Dashboard");
    }

    #[test]
    fn test_first_annotation_dropped_even_if_it_looks_like_a_word() {
        let annotations = vec![OcrAnnotation::new("secret", rect(0, 0, 1, 1))];
        assert!(extract_spans(&annotations).is_empty());
        assert!(extract_spans(&[]).is_empty());
    }

    #[test]
    fn test_empty_and_missing_descriptions_are_dropped() {
        let annotations = vec![
            OcrAnnotation::text_only("PAGE"),
            OcrAnnotation::new("", rect(0, 0, 1, 1)),
            OcrAnnotation {
                description: None,
                bounding_poly: None,
            },
            OcrAnnotation::new("kept", rect(0, 0, 1, 1)),
        ];
        let spans = extract_spans(&annotations);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "kept");
    }

    #[test]
    fn test_missing_coordinates_default_to_zero() {
        let annotations = vec![
            OcrAnnotation::text_only("PAGE"),
            OcrAnnotation::new(
                "token",
                vec![
                    Vertex { x: None, y: Some(3) },
                    Vertex { x: Some(7), y: None },
                    Vertex::default(),
                ],
            ),
        ];
        let spans = extract_spans(&annotations);
        assert_eq!(
            spans[0].polygon,
            vec![Point::new(0, 3), Point::new(7, 0), Point::new(0, 0)]
        );
    }

    #[test]
    fn test_missing_polygon_becomes_empty() {
        let annotations = vec![
            OcrAnnotation::text_only("PAGE"),
            OcrAnnotation::text_only("floating"),
        ];
        let spans = extract_spans(&annotations);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].polygon.is_empty());
    }

    #[test]
    fn test_vertex_order_is_preserved() {
        let vertices = vec![
            Vertex::new(10, 5),
            Vertex::new(0, 5),
            Vertex::new(0, 0),
            Vertex::new(10, 0),
        ];
        let annotations = vec![
            OcrAnnotation::text_only("PAGE"),
            OcrAnnotation::new("rotated", vertices.clone()),
        ];
        let spans = extract_spans(&annotations);
        let expected: Vec<Point> = vertices.into_iter().map(Vertex::to_point).collect();
        assert_eq!(spans[0].polygon, expected);
    }

    #[test]
    fn test_deserialize_vision_shape() {
        let raw = r#"[
            {"locale": "en", "description": "PAGE TEXT"},
            {"description": "Dashboard", "boundingPoly": {"vertices": [{"x": 20}, {"x": 30}, {"x": 30, "y": 5}, {"x": 20, "y": 5}]}}
        ]"#;
        let annotations: Vec<OcrAnnotation> = serde_json::from_str(raw).unwrap();
        let spans = extract_spans(&annotations);
        assert_eq!(spans[0].polygon[0], Point::new(20, 0));
        assert_eq!(spans[0].polygon[2], Point::new(30, 5));
    }
}
