//! One-shot artifact generation from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use studycast_models::GenerationRequest;
use studycast_worker::logging::{init_tracing, JobLogger};
use studycast_worker::materials::{generate_notes, generate_quiz};
use studycast_worker::{Capabilities, VideoPipeline, WorkerConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Video,
    Notes,
    Quiz,
}

#[derive(Parser, Debug)]
#[command(name = "studycast-render", about = "Generate one study artifact for a subtopic")]
struct Args {
    #[arg(long, value_enum, default_value_t = Kind::Video)]
    kind: Kind,

    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Text file with background notes
    #[arg(long)]
    notes: Option<PathBuf>,

    /// Background clip, overrides BACKGROUND_VIDEO
    #[arg(long)]
    background: Option<PathBuf>,

    #[arg(long)]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();
    init_tracing("studycast=info");

    let args = Args::parse();
    let mut config = WorkerConfig::from_env().context("invalid configuration")?;
    if let Some(background) = args.background {
        config.pipeline.background_video = background;
    }

    let background_notes = match &args.notes {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => String::new(),
    };
    let request = GenerationRequest::new(&args.title, &args.description, background_notes, &args.out);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let caps = Capabilities::from_config(&config, cancel_rx.clone())?;
    let logger = JobLogger::detached("render", &args.out.to_string_lossy());

    let work = async {
        match args.kind {
            Kind::Video => {
                VideoPipeline::new(caps.clone(), config.pipeline.clone(), &config.work_dir)
                    .run(&request, &logger)
                    .await
            }
            Kind::Notes => generate_notes(caps.text.as_ref(), &config.pipeline, &request).await,
            Kind::Quiz => generate_quiz(caps.text.as_ref(), &config.pipeline, &request).await,
        }
    };

    let mut cancel_rx = cancel_rx;
    let artifact = tokio::select! {
        result = work => result?,
        _ = cancel_rx.wait_for(|c| *c) => anyhow::bail!("cancelled"),
    };

    info!(
        path = %artifact.path.display(),
        duration_secs = artifact.duration_secs,
        captions = artifact.caption_count,
        "Done"
    );
    Ok(())
}
