pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::adapters::http::state::HttpState;

/// Ruta pública bajo la que se sirven las imágenes anotadas.
pub const ARTIFACTS_ROUTE: &str = "/ai_outputs";

pub fn router(state: HttpState, output_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/predict-image", post(routes::predict_image))
        .nest_service(ARTIFACTS_ROUTE, ServeDir::new(output_dir.as_ref()))
        // Sin límite de tamaño para las subidas
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
