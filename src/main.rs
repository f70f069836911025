use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use yolo_predict_api::{
    adapters::{
        http::{router, state::HttpState},
        onnx::{model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
        storage::artifact_store::JpegArtifactStore,
    },
    application::{
        ports::{ArtifactStorePort, ModelCatalogPort},
        services::PredictionService,
    },
    config::Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto) hacia stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    let infer = settings.inference_config();

    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Validar y cargar el modelo una única vez, antes de aceptar tráfico
    infer.params.validate().context("invalid inference parameters")?;
    OnnxModelCatalog::new()
        .validate_model(&infer.model)
        .await
        .context("model validation failed")?;
    let engine = Arc::new(OnnxYoloEngine::load(&infer, settings.intra_threads)?);

    // 3. Directorio de salida (idempotente)
    let store = Arc::new(JpegArtifactStore::new(&settings.output_dir));
    store.prepare()?;

    // 4. Servicio (Capa de Aplicación) y estado de la API
    let state = HttpState {
        predictor: Arc::new(PredictionService::new(engine, store)),
    };
    let app = router(state, &settings.output_dir);

    // 5. Lanzar el Servidor
    let addr = settings.bind_addr();
    tracing::info!("🚀 Servidor YOLO iniciado en http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("No se pudo escuchar Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
