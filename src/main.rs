//! Training run entry point
//!
//! Reads `USVISA_DOCSTORE_URL` and `USVISA_REGISTRY_URL`, runs every stage
//! once and reports whether the model was pushed. An `https://` registry URL
//! is an S3-compatible endpoint and also needs
//! `USVISA_REGISTRY_ACCESS_KEY_ID` and `USVISA_REGISTRY_SECRET_ACCESS_KEY`.
//! Logging follows `RUST_LOG` (default `info`).

use anyhow::Context;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visa_pipeline::config::{store_location_from_env, PipelineConfig};
use visa_pipeline::constants::{DOCSTORE_URL_ENV_KEY, REGISTRY_URL_ENV_KEY};
use visa_pipeline::pipeline::TrainPipeline;
use visa_pipeline::registry::open_store;
use visa_pipeline::source::JsonLinesStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::from_env();
    let documents = JsonLinesStore::new(
        store_location_from_env(DOCSTORE_URL_ENV_KEY).context("document store is not configured")?,
    );
    let registry_url = std::env::var(REGISTRY_URL_ENV_KEY)
        .with_context(|| format!("Environment variable: {REGISTRY_URL_ENV_KEY} is not set."))?;
    let registry = open_store(&registry_url).context("model registry is not configured")?;

    println!("Run:        {}", config.timestamp());
    println!("Artifacts:  {}", config.artifact_dir().display());

    let start = Instant::now();
    let pipeline = TrainPipeline::new(config, Box::new(documents), registry);
    let outcome = pipeline.run_pipeline().context("training pipeline failed")?;
    let elapsed = start.elapsed();

    let metric = outcome.trainer.metric_artifact();
    println!(
        "Trained:    f1={:.4} precision={:.4} recall={:.4}",
        metric.f1_score, metric.precision_score, metric.recall_score
    );
    println!(
        "Evaluated:  accepted={} change={:+.4}",
        outcome.evaluation.is_model_accepted(),
        outcome.evaluation.changed_accuracy()
    );
    match &outcome.pusher {
        Some(pushed) => println!(
            "Pushed:     {}/{}",
            pushed.bucket_name(),
            pushed.registry_model_path()
        ),
        None => println!("Pushed:     no (registered model kept)"),
    }
    println!("Elapsed:    {:.2}s", elapsed.as_secs_f64());
    Ok(())
}
