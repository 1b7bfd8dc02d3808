use reelsplit::adapters::http::{router, AppState};
use reelsplit::{Config, OrchestratorService, RealTranscodeExecutor, SourceStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    config.ensure_directories().await?;

    let executor = RealTranscodeExecutor::new(&config.ffmpeg_bin, &config.ffprobe_bin);
    let orchestrator = OrchestratorService::new(executor, config.transcode_settings())
        .with_max_concurrent(config.max_concurrent_transcodes);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        store: SourceStore::new(&config.upload_dir, config.max_upload_bytes),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %config.bind_address(),
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        "listening"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
