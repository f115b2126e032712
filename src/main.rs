use std::sync::Arc;

use clap::Parser;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use nutriscan::adapters::{
    http::{router, state::HttpState},
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    storage::upload_dir::LocalUploadStore,
};
use nutriscan::application::{ports::ModelCatalogPort, services::AnalysisService};
use nutriscan::cli::Args;
use nutriscan::config::AppConfig;
use nutriscan::domain::nutrition::NutritionTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Configuración: defaults < fichero < entorno < CLI
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    tracing::info!("🔧 Cargando artefactos del modelo...");

    // 3. Artefactos del modelo; cualquier fallo aquí es fatal
    let artifacts = config.model.artifacts();
    let descriptor = OnnxModelCatalog::new().describe(&artifacts).await?;
    tracing::info!(
        "Modelo {} ({} clases, red {}x{}, {} capas yolo)",
        artifacts.weights.display(),
        descriptor.class_names.len(),
        descriptor.network.width,
        descriptor.network.height,
        descriptor.network.yolo_layers
    );

    let params = config.detection.params(&descriptor.network);
    let engine = OnnxYoloEngine::load(&artifacts.weights, descriptor.class_names, params, config.model.intra_threads)?;

    // 4. Adaptadores y caso de uso
    let detector = Arc::new(OnnxDetector::new(engine));
    let store = Arc::new(LocalUploadStore::create(&config.server.upload_dir)?);
    let nutrition = Arc::new(NutritionTable::builtin());
    tracing::info!("Tabla nutricional: {} alimentos", nutrition.len());

    let state = HttpState {
        analysis: Arc::new(AnalysisService::new(detector, store, nutrition)),
    };

    // 5. Router + estáticos
    let app = router(state, config.server.max_upload_bytes)
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(TraceLayer::new_for_http());

    // 6. Servidor
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("🚀 Servidor iniciado en http://{}", addr);
    tracing::info!("📂 Estáticos desde {}", config.server.static_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
