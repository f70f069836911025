use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Stride máximo de las cabezas YOLO; el tamaño de entrada debe ser múltiplo.
pub const MAX_STRIDE: u32 = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,      // nombre lógico, p. ej. "best"
    pub onnx_path: String, // ruta de los pesos
}

/// Parámetros de inferencia. Los valores por defecto son los de `predict` en Ultralytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

impl YoloParams {
    pub fn validate(&self) -> DomainResult<()> {
        if self.input_size == 0 || self.input_size % MAX_STRIDE != 0 {
            return Err(DomainError::InvalidInput(format!(
                "input size {} must be a positive multiple of {}",
                self.input_size, MAX_STRIDE
            )));
        }
        for (name, value) in [("conf", self.conf_threshold), ("iou", self.iou_threshold)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidInput(format!("{} threshold {} outside [0, 1]", name, value)));
            }
        }
        if self.max_detections == 0 {
            return Err(DomainError::InvalidInput("max detections must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub model: ModelId,
    pub params: YoloParams,
}
