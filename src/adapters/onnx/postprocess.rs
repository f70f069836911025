use ndarray::ArrayView2;

use crate::domain::{detection::Detection, model::YoloParams};

/// Gris de relleno que usa Ultralytics en el letterbox.
pub const LETTERBOX_FILL: u8 = 114;

/// Geometría de un resize con relleno (aspecto preservado) a un lienzo cuadrado.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub size: u32,
    pub scale: f32,
    pub new_w: u32,
    pub new_h: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    pub fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);
        let pad_x = ((size - new_w) as f32 / 2.0 - 0.1).round().max(0.0) as u32;
        let pad_y = ((size - new_h) as f32 / 2.0 - 0.1).round().max(0.0) as u32;
        Self { size, scale, new_w, new_h, pad_x, pad_y }
    }

    /// Lleva un punto del lienzo del modelo a la imagen original.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x as f32) / self.scale, (y - self.pad_y as f32) / self.scale)
    }
}

/// Strides de las tres cabezas de detección.
const HEAD_STRIDES: [u32; 3] = [8, 16, 32];

/// Número de anclas que produce un modelo con entrada `input_size x input_size`
/// (8400 para 640).
pub fn anchor_count(input_size: u32) -> usize {
    HEAD_STRIDES
        .iter()
        .map(|s| ((input_size / s) * (input_size / s)) as usize)
        .sum()
}

/// Algunas exportaciones devuelven `[N, 4 + nc]` en lugar de `[4 + nc, N]`.
/// El eje de anclas se identifica por su longitud esperada, no por ser el más largo.
pub fn to_feature_major(output: ArrayView2<'_, f32>, input_size: u32) -> ArrayView2<'_, f32> {
    let anchors = anchor_count(input_size);
    if output.nrows() == anchors && output.ncols() != anchors {
        output.reversed_axes()
    } else {
        output
    }
}

/// Decodifica la salida `[4 + nc, N]` de YOLOv8/11.
/// Devuelve las detecciones tras NMS por clase, ordenadas por confianza descendente.
pub fn decode_predictions(
    view: ArrayView2<f32>,
    letterbox: &Letterbox,
    params: &YoloParams,
    image_w: u32,
    image_h: u32,
) -> anyhow::Result<Vec<Detection>> {
    let features = view.nrows();
    if features < 5 {
        anyhow::bail!("unexpected YOLO output shape {:?}", view.shape());
    }

    let (max_x, max_y) = (image_w as f32, image_h as f32);
    let mut candidates = Vec::new();

    for i in 0..view.ncols() {
        let column = view.column(i);
        let (class_id, score) = column
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (c, s)| if s > best.1 { (c, s) } else { best });

        if score < params.conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

        candidates.push(Detection {
            bbox: [x1.clamp(0.0, max_x), y1.clamp(0.0, max_y), x2.clamp(0.0, max_x), y2.clamp(0.0, max_y)],
            confidence: score.clamp(0.0, 1.0),
            class_id: class_id as u32,
        });
    }

    let mut kept = nms(candidates, params.iou_threshold);
    kept.truncate(params.max_detections);
    Ok(kept)
}

/// Supresión de no-máximos por clase.
pub fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut result: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = result
            .iter()
            .any(|kept| kept.class_id == det.class_id && iou(&kept.bbox, &det.bbox) > iou_threshold);
        if !suppressed {
            result.push(det);
        }
    }
    result
}

pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn det(bbox: [f32; 4], confidence: f32, class_id: u32) -> Detection {
        Detection { bbox, confidence, class_id }
    }

    /// Construye una salida [4 + nc, N] a partir de (cx, cy, w, h, scores).
    fn raw_output(cands: &[([f32; 4], Vec<f32>)]) -> Array2<f32> {
        let nc = cands[0].1.len();
        let mut out = Array2::<f32>::zeros((4 + nc, cands.len()));
        for (i, (b, scores)) in cands.iter().enumerate() {
            for k in 0..4 {
                out[[k, i]] = b[k];
            }
            for (c, s) in scores.iter().enumerate() {
                out[[4 + c, i]] = *s;
            }
        }
        out
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        assert!((iou(&a, &[5.0, 0.0, 15.0, 10.0]) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn nms_is_class_aware() {
        let dets = vec![
            det([0.0, 0.0, 10.0, 10.0], 0.8, 0),
            det([1.0, 1.0, 10.0, 10.0], 0.9, 0),
            det([0.0, 0.0, 10.0, 10.0], 0.7, 1),
        ];
        let kept = nms(dets, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].class_id, 1);
    }

    #[test]
    fn letterbox_for_wide_image() {
        let lb = Letterbox::fit(1280, 640, 640);
        assert_eq!(lb.scale, 0.5);
        assert_eq!((lb.new_w, lb.new_h), (640, 320));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
        assert_eq!(lb.unmap(320.0, 320.0), (640.0, 320.0));
    }

    #[test]
    fn letterbox_square_has_no_padding() {
        let lb = Letterbox::fit(100, 100, 640);
        assert_eq!((lb.new_w, lb.new_h), (640, 640));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 0));
    }

    #[test]
    fn decodes_and_rescales_boxes() {
        // Imagen 1280x640 -> escala 0.5, relleno vertical 160
        let lb = Letterbox::fit(1280, 640, 640);
        let out = raw_output(&[
            ([320.0, 320.0, 100.0, 50.0], vec![0.1, 0.9]),
            ([100.0, 200.0, 20.0, 20.0], vec![0.05, 0.1]),
        ]);
        let dets = decode_predictions(out.view(), &lb, &YoloParams::default(), 1280, 640).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert!((dets[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(dets[0].bbox, [540.0, 270.0, 740.0, 370.0]);
    }

    #[test]
    fn accepts_transposed_layout() {
        let lb = Letterbox::fit(640, 640, 640);
        // entrada 32x32 -> 16 + 4 + 1 = 21 anclas
        let cands: Vec<_> = (0..21)
            .map(|i| ([10.0 + 25.0 * i as f32, 50.0, 10.0, 10.0], vec![0.5, 0.0]))
            .collect();
        let out = raw_output(&cands).reversed_axes();
        assert_eq!(out.shape(), &[21, 6]);

        let view = to_feature_major(out.view(), 32);
        assert_eq!(view.shape(), &[6, 21]);
        let dets = decode_predictions(view, &lb, &YoloParams::default(), 640, 640).unwrap();
        assert_eq!(dets.len(), 21);
    }

    #[test]
    fn feature_major_output_with_few_anchors_is_kept() {
        let out = Array2::<f32>::zeros((84, 21));
        assert_eq!(to_feature_major(out.view(), 32).shape(), &[84, 21]);

        let full = Array2::<f32>::zeros((84, 8400));
        assert_eq!(to_feature_major(full.view(), 640).shape(), &[84, 8400]);
        let transposed = full.t();
        assert_eq!(to_feature_major(transposed, 640).shape(), &[84, 8400]);
    }

    #[test]
    fn anchor_count_per_input_size() {
        assert_eq!(anchor_count(640), 8400);
        assert_eq!(anchor_count(32), 21);
    }

    #[test]
    fn clips_to_image_and_limits_count() {
        let lb = Letterbox::fit(640, 640, 640);
        let out = raw_output(&[
            ([5.0, 5.0, 40.0, 40.0], vec![0.95]),
            ([300.0, 300.0, 10.0, 10.0], vec![0.6]),
            ([500.0, 500.0, 10.0, 10.0], vec![0.5]),
        ]);
        let params = YoloParams { max_detections: 2, ..Default::default() };
        let dets = decode_predictions(out.view(), &lb, &params, 640, 640).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].bbox[0], 0.0);
        assert_eq!(dets[0].bbox[1], 0.0);
        assert!(dets.iter().all(|d| (0.0..=1.0).contains(&d.confidence)));
    }

    #[test]
    fn rejects_degenerate_output() {
        let lb = Letterbox::fit(10, 10, 640);
        let out = Array2::<f32>::zeros((3, 3));
        assert!(decode_predictions(out.view(), &lb, &YoloParams::default(), 10, 10).is_err());
    }
}
