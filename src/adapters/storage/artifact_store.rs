use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::annotate::Annotator;
use crate::application::ports::ArtifactStorePort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    labels::LabelSet,
};

pub const DEFAULT_OUTPUT_DIR: &str = "ai_outputs";
pub const OUTPUT_SUFFIX: &str = "_detected.jpg";
const JPEG_QUALITY: u8 = 90;

/// Guarda cada imagen anotada como `<dir>/<uuid-v4>_detected.jpg`.
/// Los ficheros no se borran nunca.
pub struct JpegArtifactStore {
    dir: PathBuf,
    annotator: Annotator,
}

impl JpegArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), annotator: Annotator::new() }
    }

    fn next_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}", Uuid::new_v4(), OUTPUT_SUFFIX))
    }

    fn write_jpeg(path: &Path, image: &RgbImage) -> anyhow::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(image)?;
        writer.flush()?;
        Ok(())
    }
}

impl ArtifactStorePort for JpegArtifactStore {
    fn prepare(&self) -> DomainResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DomainError::Persist(format!("cannot create {}: {}", self.dir.display(), e)))?;
        info!("📂 Imágenes anotadas en {}", self.dir.display());
        Ok(())
    }

    fn persist(&self, image: &RgbImage, detections: &[Detection], labels: &LabelSet) -> DomainResult<String> {
        let path = self.next_path();

        let mut annotated = image.clone();
        self.annotator.draw(&mut annotated, detections, labels);

        Self::write_jpeg(&path, &annotated).map_err(|e| DomainError::Persist(format!("{}: {:#}", path.display(), e)))?;
        debug!("Imagen anotada guardada en {}", path.display());

        Ok(path.to_string_lossy().into_owned())
    }
}
