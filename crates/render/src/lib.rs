//! Mask rendering for redacted images.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::rect::Rect;
use redact_core::{Point, SensitiveSet, TextSpan};
use std::io::Cursor;

/// 遮盖颜色（不透明红色）
pub const MASK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct MaskedImage {
    pub image: RgbaImage,
    /// 实际填充的片段数
    pub masked: usize,
}

/// 在原图上遮盖敏感片段
///
/// 按片段顺序处理，命中集合且多边形非空的片段按顶点原始顺序闭合后填充，
/// 重叠区域以后填充的为准。其余像素保持不变。
pub fn render_masks(source: &DynamicImage, spans: &[TextSpan], sensitive: &SensitiveSet) -> MaskedImage {
    let mut image = source.to_rgba8();
    let mut masked = 0;

    for span in spans {
        if !sensitive.contains(&span.text) || span.polygon.is_empty() {
            continue;
        }
        match fill_polygon(&span.polygon) {
            Some(poly) => {
                let painted = fill_mut(&mut image, &poly, MASK_COLOR);
                masked += 1;
                log::debug!(
                    "[Render] 遮盖 \"{}\": {:?}，{} 像素",
                    span.text,
                    span.polygon,
                    painted
                );
            }
            None => {
                log::debug!("[Render] 跳过退化多边形 \"{}\": {:?}", span.text, span.polygon);
            }
        }
    }

    log::info!("[Render] 遮盖 {} 个区域", masked);
    MaskedImage { image, masked }
}

/// 将片段多边形整理为可填充的顶点序列
///
/// 合并相邻重复点并去掉与首点重合的闭合点，路径闭合由填充时完成。
/// 不足三个顶点的多边形没有面积，返回 `None`。
fn fill_polygon(polygon: &[Point]) -> Option<Vec<Point>> {
    let mut points: Vec<Point> = Vec::with_capacity(polygon.len());
    for p in polygon {
        if points.last() != Some(p) {
            points.push(*p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() < 3 {
        return None;
    }
    Some(points)
}

/// 填充闭合多边形，返回改动的像素数
///
/// 像素中心 `(x + 0.5, y + 0.5)` 落在多边形内部（非零环绕规则）才填充，
/// 因此相邻片段共享的边不会被涂到对方区域。
fn fill_mut(image: &mut RgbaImage, poly: &[Point], color: Rgba<u8>) -> usize {
    let Some(area) = polygon_bounds(poly).and_then(|b| b.intersect(image_bounds(image)?)) else {
        return 0;
    };

    let mut painted = 0;
    for y in area.top()..=area.bottom() {
        for x in area.left()..=area.right() {
            if winding_number(poly, x as f64 + 0.5, y as f64 + 0.5) != 0 {
                image.put_pixel(x as u32, y as u32, color);
                painted += 1;
            }
        }
    }
    painted
}

/// 多边形覆盖的像素范围，宽或高为 0 时返回 `None`
fn polygon_bounds(poly: &[Point]) -> Option<Rect> {
    let min_x = poly.iter().map(|p| p.x).min()?;
    let max_x = poly.iter().map(|p| p.x).max()?;
    let min_y = poly.iter().map(|p| p.y).min()?;
    let max_y = poly.iter().map(|p| p.y).max()?;
    if max_x <= min_x || max_y <= min_y {
        return None;
    }
    Some(Rect::at(min_x, min_y).of_size((max_x - min_x) as u32, (max_y - min_y) as u32))
}

fn image_bounds(image: &RgbaImage) -> Option<Rect> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    Some(Rect::at(0, 0).of_size(w, h))
}

/// 点 `(px, py)` 关于闭合多边形的环绕数
fn winding_number(poly: &[Point], px: f64, py: f64) -> i32 {
    let mut winding = 0;
    for (i, a) in poly.iter().enumerate() {
        let b = &poly[(i + 1) % poly.len()];
        let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let cross = (bx - ax) * (py - ay) - (px - ax) * (by - ay);
        if ay <= py {
            if by > py && cross > 0.0 {
                winding += 1;
            }
        } else if by <= py && cross < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 编码为 PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(RenderError::Encode)?;
    Ok(output)
}

/// 读取源图片
pub fn open_image(path: &std::path::Path) -> Result<DynamicImage, RenderError> {
    image::open(path).map_err(RenderError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: Rgba<u8> = Rgba([200, 200, 200, 255]);

    fn canvas(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, BACKGROUND))
    }

    fn span(text: &str, rect: (i32, i32, i32, i32)) -> TextSpan {
        let (x0, y0, x1, y1) = rect;
        TextSpan {
            text: text.to_string(),
            polygon: vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
        }
    }

    fn region(image: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<Rgba<u8>> {
        let mut pixels = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                pixels.push(*image.get_pixel(x, y));
            }
        }
        pixels
    }

    #[test]
    fn test_sensitive_span_is_filled() {
        let source = canvas(40, 10);
        let spans = vec![
            span("alice@example.com", (0, 0, 10, 5)),
            span("Dashboard", (20, 0, 30, 5)),
        ];
        let sensitive: SensitiveSet = ["alice@example.com"].into_iter().collect();

        let result = render_masks(&source, &spans, &sensitive);
        assert_eq!(result.masked, 1);
        assert!(region(&result.image, 0, 0, 9, 4).iter().all(|p| *p == MASK_COLOR));
        assert!(region(&result.image, 10, 0, 39, 9).iter().all(|p| *p == BACKGROUND));
        assert!(region(&result.image, 0, 5, 39, 9).iter().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_touching_spans_do_not_bleed() {
        let source = canvas(20, 5);
        let spans = vec![span("secret", (0, 0, 10, 5)), span("Dashboard", (10, 0, 20, 5))];
        let sensitive: SensitiveSet = ["secret"].into_iter().collect();

        let result = render_masks(&source, &spans, &sensitive);
        assert!(region(&result.image, 0, 0, 9, 4).iter().all(|p| *p == MASK_COLOR));
        assert!(region(&result.image, 10, 0, 19, 4).iter().all(|p| *p == BACKGROUND));
        let painted = result.image.pixels().filter(|p| **p == MASK_COLOR).count();
        assert_eq!(painted, 50);
    }

    #[test]
    fn test_triangle_follows_vertices() {
        let source = canvas(10, 10);
        let spans = vec![TextSpan {
            text: "t".to_string(),
            polygon: vec![Point::new(0, 0), Point::new(8, 0), Point::new(0, 8)],
        }];
        let sensitive: SensitiveSet = ["t"].into_iter().collect();

        let result = render_masks(&source, &spans, &sensitive);
        for y in 0..10u32 {
            for x in 0..10u32 {
                let expected = if x + y < 7 { MASK_COLOR } else { BACKGROUND };
                assert_eq!(*result.image.get_pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_vertex_order_changes_shape() {
        let source = canvas(10, 10);
        let corners = |order: [usize; 4]| {
            let pts = [
                Point::new(0, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(0, 10),
            ];
            TextSpan {
                text: "k".to_string(),
                polygon: order.iter().map(|&i| pts[i]).collect(),
            }
        };
        let sensitive: SensitiveSet = ["k"].into_iter().collect();

        let rectangle = render_masks(&source, &[corners([0, 1, 2, 3])], &sensitive);
        assert_eq!(*rectangle.image.get_pixel(5, 1), MASK_COLOR);
        assert_eq!(*rectangle.image.get_pixel(1, 5), MASK_COLOR);

        // 0 -> 2 -> 1 -> 3 是沿两条对角线的蝴蝶结
        let bowtie = render_masks(&source, &[corners([0, 2, 1, 3])], &sensitive);
        assert_eq!(*bowtie.image.get_pixel(5, 1), BACKGROUND);
        assert_eq!(*bowtie.image.get_pixel(5, 8), BACKGROUND);
        assert_eq!(*bowtie.image.get_pixel(1, 5), MASK_COLOR);
        assert_eq!(*bowtie.image.get_pixel(8, 5), MASK_COLOR);
    }

    #[test]
    fn test_empty_set_leaves_image_identical() {
        let source = canvas(16, 16);
        let spans = vec![span("a", (1, 1, 8, 8))];
        let result = render_masks(&source, &spans, &SensitiveSet::new());
        assert_eq!(result.masked, 0);
        assert_eq!(result.image, source.to_rgba8());
    }

    #[test]
    fn test_dimensions_are_preserved() {
        let source = canvas(33, 17);
        let spans = vec![span("x", (-5, -5, 50, 50))];
        let sensitive: SensitiveSet = ["x"].into_iter().collect();
        let result = render_masks(&source, &spans, &sensitive);
        assert_eq!(result.image.dimensions(), (33, 17));
        assert!(result.image.pixels().all(|p| *p == MASK_COLOR));
    }

    #[test]
    fn test_empty_and_degenerate_polygons_are_skipped() {
        let source = canvas(8, 8);
        let spans = vec![
            TextSpan {
                text: "x".to_string(),
                polygon: Vec::new(),
            },
            TextSpan {
                text: "x".to_string(),
                polygon: vec![Point::new(0, 0); 4],
            },
        ];
        let sensitive: SensitiveSet = ["x"].into_iter().collect();
        let result = render_masks(&source, &spans, &sensitive);
        assert_eq!(result.masked, 0);
        assert_eq!(result.image, source.to_rgba8());
    }

    #[test]
    fn test_fill_polygon_drops_closing_vertex() {
        let closed = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 0),
        ];
        let poly = fill_polygon(&closed).unwrap();
        assert_eq!(poly.len(), 3);
        assert_ne!(poly.first(), poly.last());
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let masked = RgbaImage::from_pixel(5, 3, MASK_COLOR);
        let bytes = encode_png(&masked).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }
}
