//! Tabula server entry point.

use std::sync::Arc;

use clap::Parser;
use tabula::{
    create_router, preload_datasets, ApiState, Config, DatasetStore, OpenAiChatClient,
    QueryPipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tabula: natural-language queries over tabular datasets
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the dataset directory
    #[arg(short, long)]
    datasets: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Tabula server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI args take precedence over the config file
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(datasets) = args.datasets {
        config.datasets.data_dir = datasets;
    }

    tracing::info!(
        backend_model = %config.backend.model,
        suggest_charts = config.pipeline.suggest_charts,
        "Configuration loaded"
    );

    let store = Arc::new(DatasetStore::new());
    let loaded = preload_datasets(&store, config.datasets_dir());
    tracing::info!("Preloaded {} dataset(s)", loaded);

    let backend = Arc::new(OpenAiChatClient::from_config(&config.backend)?);
    let pipeline = Arc::new(QueryPipeline::from_config(&config, backend));
    let state = Arc::new(ApiState::new(store, pipeline));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
