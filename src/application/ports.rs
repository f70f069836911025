use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{detection::Detection, errors::DomainResult, labels::LabelSet, model::ModelId};

/// Modelo de detección ya cargado. Las llamadas son bloqueantes (CPU/GPU),
/// así que los servicios las ejecutan fuera del reactor.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage) -> DomainResult<Vec<Detection>>;
    fn labels(&self) -> &LabelSet;
}

/// Destino de las imágenes anotadas.
pub trait ArtifactStorePort: Send + Sync {
    /// Crea el directorio de salida si no existe. Idempotente.
    fn prepare(&self) -> DomainResult<()>;
    /// Dibuja las detecciones sobre `image`, la guarda y devuelve la ruta.
    fn persist(&self, image: &RgbImage, detections: &[Detection], labels: &LabelSet) -> DomainResult<String>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
