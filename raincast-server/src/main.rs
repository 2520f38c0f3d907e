//! Binary crate for the `raincast` HTTP prediction service.
//!
//! Startup loads the model artifacts and feature table, refusing to serve
//! if anything is missing or inconsistent; after that every request is
//! stateless against the immutable [`Forecaster`].

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use raincast_core::{ArtifactPaths, FeatureMode, Forecaster};

mod routes;

#[derive(Debug, Parser)]
#[command(name = "raincast-server", version, about = "Rain prediction HTTP service")]
struct Args {
    /// Socket address to bind.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Classification model artifact (rain in +7 days).
    #[arg(long, default_value = "models/rain_or_not/logreg_model.json")]
    rain_model: PathBuf,

    /// Regression model artifact (3-day precipitation sum).
    #[arg(long, default_value = "models/precipitation_fall/ridge_model.json")]
    precip_model: PathBuf,

    /// Daily feature table; must contain a 'time' column.
    #[arg(long, default_value = "data/features_daily.csv")]
    features_csv: PathBuf,

    /// Optional JSON array naming the expected feature columns.
    #[arg(long)]
    feature_columns: Option<PathBuf>,

    /// Feature source: "table", or the experimental "dummy" (zero-filled rows).
    #[arg(long, default_value = "table")]
    features: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mode = FeatureMode::try_from(args.features.as_str())?;
    let paths = ArtifactPaths {
        rain_model: args.rain_model,
        precip_model: args.precip_model,
        features_csv: args.features_csv,
        feature_columns: args.feature_columns,
    };

    let forecaster = Forecaster::load(&paths, mode)?;
    tracing::info!(
        mode = %mode,
        columns = forecaster.feature_names().len(),
        "models and features loaded"
    );

    let app = routes::router(Arc::new(forecaster));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!("listening on {}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
