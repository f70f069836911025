#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tower::util::ServiceExt;

use yolo_predict_api::{
    adapters::{
        http::{router, state::HttpState},
        storage::artifact_store::JpegArtifactStore,
    },
    application::{
        ports::{ArtifactStorePort, DetectorPort},
        services::PredictionService,
    },
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        labels::LabelSet,
    },
};

pub const BOUNDARY: &str = "----yolo-predict-test-boundary";

/// Detector de pega: devuelve siempre las mismas detecciones.
pub struct StubDetector {
    pub detections: Vec<Detection>,
    pub labels: LabelSet,
}

impl StubDetector {
    pub fn empty() -> Self {
        Self { detections: vec![], labels: LabelSet::default() }
    }

    pub fn with(detections: Vec<Detection>) -> Self {
        Self { detections, labels: LabelSet::from_names(["pothole", "crack"]) }
    }
}

impl DetectorPort for StubDetector {
    fn detect(&self, _image: &RgbImage) -> DomainResult<Vec<Detection>> {
        Ok(self.detections.clone())
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Detector que siempre falla, para comprobar la ruta de error 500.
pub struct BrokenDetector;

impl DetectorPort for BrokenDetector {
    fn detect(&self, _image: &RgbImage) -> DomainResult<Vec<Detection>> {
        Err(DomainError::Inference("onnxruntime exploded".into()))
    }

    fn labels(&self) -> &LabelSet {
        static EMPTY: std::sync::OnceLock<LabelSet> = std::sync::OnceLock::new();
        EMPTY.get_or_init(LabelSet::default)
    }
}

pub fn app(detector: impl DetectorPort + 'static, output_dir: &Path) -> Router {
    let store = Arc::new(JpegArtifactStore::new(output_dir));
    store.prepare().unwrap();
    let state = HttpState {
        predictor: Arc::new(PredictionService::new(Arc::new(detector), store)),
    };
    router(state, output_dir)
}

pub enum Part<'a> {
    File { name: &'a str, filename: &'a str, content_type: &'a str, data: Vec<u8> },
    Text { name: &'a str, value: &'a str },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, content_type, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn image_part(data: Vec<u8>) -> Part<'static> {
    Part::File { name: "image", filename: "upload.jpg", content_type: "image/jpeg", data }
}

pub fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn black_jpeg(w: u32, h: u32) -> Vec<u8> {
    encode(RgbImage::new(w, h), ImageFormat::Jpeg)
}

pub async fn post_multipart(app: Router, parts: &[Part<'_>]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict-image")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
