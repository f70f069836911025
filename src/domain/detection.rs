use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::labels::LabelSet;

/// Objeto detectado, en coordenadas de píxel de la imagen original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: u32,
}

/// Resultado completo de una petición: detecciones y ruta de la imagen anotada.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub detections: Vec<Detection>,
    pub output_image: String,
}

/// Resumen legible para los logs, p. ej. "2 person, 1 car".
pub fn summarize_detections(detections: &[Detection], labels: &LabelSet) -> String {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(labels.name(det.class_id)).or_insert(0usize) += 1;
    }
    counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
