use clap::Parser;

use crate::adapters::storage::artifact_store::DEFAULT_OUTPUT_DIR;
use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Servidor HTTP de detección de objetos con YOLO (ONNX).
/// Cada opción se puede fijar también con su variable de entorno.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// Interfaz de escucha
    #[arg(long, env = "PREDICT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Puerto de escucha
    #[arg(long, env = "PREDICT_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Pesos del modelo (exportación ONNX de Ultralytics)
    #[arg(long, env = "PREDICT_MODEL", default_value = "best.onnx", value_name = "FILE")]
    pub model: String,

    /// Directorio donde se guardan las imágenes anotadas
    #[arg(long, env = "PREDICT_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR, value_name = "DIR")]
    pub output_dir: String,

    /// Tamaño de entrada del modelo
    #[arg(long, env = "PREDICT_IMGSZ", default_value_t = 640)]
    pub imgsz: u32,

    /// Umbral de confianza (0.0 - 1.0)
    #[arg(long, env = "PREDICT_CONF", default_value_t = 0.25, value_name = "THRESHOLD")]
    pub conf: f32,

    /// Umbral IoU de NMS (0.0 - 1.0)
    #[arg(long, env = "PREDICT_IOU", default_value_t = 0.7, value_name = "THRESHOLD")]
    pub iou: f32,

    /// Máximo de detecciones por imagen
    #[arg(long, env = "PREDICT_MAX_DET", default_value_t = 300)]
    pub max_det: usize,

    /// Hilos intra-op de ONNX Runtime
    #[arg(long, env = "PREDICT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn inference_config(&self) -> InferenceConfig {
        let name = std::path::Path::new(&self.model)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());

        InferenceConfig {
            model: ModelId { name, onnx_path: self.model.clone() },
            params: YoloParams {
                input_size: self.imgsz,
                conf_threshold: self.conf,
                iou_threshold: self.iou,
                max_detections: self.max_det,
            },
        }
    }
}
