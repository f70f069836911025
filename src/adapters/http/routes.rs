use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::adapters::http::state::HttpState;
use crate::application::dto::PredictResponse;
use crate::domain::errors::{DomainError, DomainResult};

/// Nombre del campo multipart que contiene la imagen.
pub const IMAGE_FIELD: &str = "image";

pub async fn predict_image(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let bytes = match read_image_field(multipart).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };

    match st.predictor.predict(bytes).await {
        Ok(prediction) => (StatusCode::OK, Json(PredictResponse::from(prediction))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Busca el fichero `image`. Solo cuentan las partes con `filename` (aunque
/// esté vacío); un campo de texto llamado `image` equivale a no enviar imagen.
/// Un cuerpo que no es multipart, o que no se puede recorrer, también.
async fn read_image_field(multipart: Result<Multipart, MultipartRejection>) -> DomainResult<Vec<u8>> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            warn!("Petición sin multipart válido: {}", rejection);
            return Err(DomainError::MissingInput);
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(DomainError::MissingInput),
            Err(e) => {
                warn!("Multipart mal formado: {}", e);
                return Err(DomainError::MissingInput);
            }
        };

        if field.name() == Some(IMAGE_FIELD) && field.file_name().is_some() {
            return field
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| DomainError::Internal(format!("cannot read upload: {}", e)));
        }
    }
}

pub fn status_for(err: &DomainError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Error: {}", self);
        }
        (status, Json(PredictResponse::failed(&self))).into_response()
    }
}
