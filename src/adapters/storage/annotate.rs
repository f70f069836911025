use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::glyphs::{draw_text, text_width, GLYPH_HEIGHT};
use crate::domain::{detection::Detection, labels::LabelSet};

const PALETTE_SIZE: usize = 20;
const LABEL_PADDING: i32 = 2;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Dibuja cajas y etiquetas "nombre 0.87" sobre la imagen, un color por clase.
pub struct Annotator {
    colors: Vec<Rgb<u8>>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    pub fn new() -> Self {
        let colors = (0..PALETTE_SIZE)
            .map(|i| hsv_to_rgb(i as f32 / PALETTE_SIZE as f32 * 360.0, 0.8, 0.9))
            .collect();
        Self { colors }
    }

    pub fn color_for(&self, class_id: u32) -> Rgb<u8> {
        self.colors[class_id as usize % self.colors.len()]
    }

    pub fn draw(&self, image: &mut RgbImage, detections: &[Detection], labels: &LabelSet) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let line_width = line_width(image.width(), image.height());
        let text_scale = (line_width / 2).max(1);

        for det in detections {
            let color = self.color_for(det.class_id);
            let (w, h) = (image.width() as f32 - 1.0, image.height() as f32 - 1.0);
            let left = det.bbox[0].clamp(0.0, w).floor() as i32;
            let top = det.bbox[1].clamp(0.0, h).floor() as i32;
            let right = det.bbox[2].clamp(0.0, w).ceil() as i32;
            let bottom = det.bbox[3].clamp(0.0, h).ceil() as i32;

            if left >= right || top >= bottom {
                continue;
            }

            for t in 0..line_width as i32 {
                let ring_w = right - left + 1 - 2 * t;
                let ring_h = bottom - top + 1 - 2 * t;
                if ring_w <= 0 || ring_h <= 0 {
                    break;
                }
                let rect = Rect::at(left + t, top + t).of_size(ring_w as u32, ring_h as u32);
                draw_hollow_rect_mut(image, rect, color);
            }

            let label = format!("{} {:.2}", labels.name(det.class_id), det.confidence);
            let label_w = text_width(&label, text_scale) as i32 + 2 * LABEL_PADDING;
            let label_h = (GLYPH_HEIGHT * text_scale) as i32 + 2 * LABEL_PADDING;
            // Encima de la caja si cabe, si no por dentro.
            let label_y = if top >= label_h { top - label_h } else { top };

            draw_filled_rect_mut(image, Rect::at(left, label_y).of_size(label_w as u32, label_h as u32), color);
            draw_text(image, left + LABEL_PADDING, label_y + LABEL_PADDING, &label, TEXT_COLOR, text_scale);
        }
    }
}

/// Grosor de línea proporcional al tamaño de la imagen (mínimo 2 px).
fn line_width(width: u32, height: u32) -> u32 {
    (((width + height) as f32 / 2.0) * 0.003).round().max(2.0) as u32
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Rgb([((r + m) * 255.0) as u8, ((g + m) * 255.0) as u8, ((b + m) * 255.0) as u8])
}
