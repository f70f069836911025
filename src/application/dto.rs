use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::{Detection, Prediction},
    errors::DomainError,
};

/// Cuerpo JSON de `/predict-image`. Cada variante lleva exactamente sus claves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Success {
        success: bool,
        detections: Vec<Detection>,
        output_image: String,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl PredictResponse {
    pub fn failed(err: &DomainError) -> Self {
        PredictResponse::Failure { success: false, error: err.to_string() }
    }
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        PredictResponse::Success {
            success: true,
            detections: p.detections,
            output_image: p.output_image,
        }
    }
}
