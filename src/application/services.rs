use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info};

use crate::{
    application::ports::{ArtifactStorePort, DetectorPort},
    domain::{
        detection::{summarize_detections, Prediction},
        errors::{DomainError, DomainResult},
    },
};

/// Caso de uso principal: decodificar -> inferir -> guardar la imagen anotada.
/// Cualquier fallo corta el pipeline; no hay reintentos ni resultados parciales.
#[derive(Clone)]
pub struct PredictionService {
    detector: Arc<dyn DetectorPort>,
    store: Arc<dyn ArtifactStorePort>,
}

impl PredictionService {
    pub fn new(detector: Arc<dyn DetectorPort>, store: Arc<dyn ArtifactStorePort>) -> Self {
        Self { detector, store }
    }

    /// Ejecuta el pipeline completo en el pool bloqueante de Tokio.
    pub async fn predict(&self, bytes: Vec<u8>) -> DomainResult<Prediction> {
        let detector = self.detector.clone();
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || run_pipeline(detector.as_ref(), store.as_ref(), &bytes))
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?
    }
}

fn run_pipeline(detector: &dyn DetectorPort, store: &dyn ArtifactStorePort, bytes: &[u8]) -> DomainResult<Prediction> {
    let image = decode_image(bytes)?;
    debug!("Imagen decodificada: {}x{}", image.width(), image.height());

    let detections = detector.detect(&image)?;
    let output_image = store.persist(&image, &detections, detector.labels())?;

    info!(
        "{} detecciones [{}] -> {}",
        detections.len(),
        summarize_detections(&detections, detector.labels()),
        output_image
    );

    Ok(Prediction { detections, output_image })
}

/// Decodifica cualquier formato soportado por `image` (se deduce del contenido).
pub fn decode_image(bytes: &[u8]) -> DomainResult<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| DomainError::Decode(e.to_string()))
}
