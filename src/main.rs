use anyhow::{Context, Result};
use clap::Parser;
use deforestation_exports::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deforestation-exports")]
#[command(about = "Correlate Brazilian agricultural exports with Amazon deforestation")]
struct Args {
    /// Data directory holding raw/ inputs and processed/ outputs (default: ./data)
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Optional JSON config overriding paths, country/element and threshold policy
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    }
    .resolve(&args.data_dir);

    info!(
        deforestation = %config.deforestation_path.display(),
        trade = %config.trade_path.display(),
        output = %config.output_dir.display(),
        policy = ?config.policy,
        "Pipeline starting"
    );

    let pipeline = Pipeline::new(config);
    match pipeline.run() {
        Ok(written) => {
            for path in &written {
                info!(path = %path.display(), "Wrote table");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            Err(e.into())
        }
    }
}
