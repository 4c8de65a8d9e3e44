use std::path::Path;
use std::process::Command;

use studycast_ai::{SpeechBackend, TextProvider, TranscriberBackend};
use studycast_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env()?;

    println!(
        "worker-selfcheck: starting with work_dir={} uploads_root={}",
        config.work_dir.display(),
        config.uploads_root.display()
    );
    ensure_dir(&config.work_dir).await?;
    ensure_dir(&config.uploads_root).await?;
    ensure_tool("ffmpeg", "-version")?;
    ensure_tool("ffprobe", "-version")?;
    ensure_file(&config.pipeline.background_video)?;

    let mut vars = Vec::new();
    for provider in [config.script_provider, config.text_provider] {
        vars.push(match provider {
            TextProvider::Gemini => "GEMINI_API_KEY",
            TextProvider::OpenAi => "OPENAI_API_KEY",
        });
    }
    match config.speech_backend {
        SpeechBackend::EdgeTts => ensure_which(&std::env::var("EDGE_TTS_BIN").unwrap_or_else(|_| "edge-tts".into()))?,
        SpeechBackend::OpenAi => vars.push("OPENAI_API_KEY"),
    }
    match config.transcriber {
        TranscriberBackend::WhisperCli => ensure_which(&std::env::var("WHISPER_BIN").unwrap_or_else(|_| "whisper".into()))?,
        TranscriberBackend::OpenAi => vars.push("OPENAI_API_KEY"),
    }
    vars.sort_unstable();
    vars.dedup();
    ensure_env_present(&vars)?;
    if std::env::var("GEMINI_API_KEY").is_err() {
        println!("worker-selfcheck: GEMINI_API_KEY not set, document analysis disabled");
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path.as_ref()).await?;
    Ok(())
}

fn ensure_tool(program: &str, version_flag: &str) -> anyhow::Result<()> {
    let output = Command::new(program)
        .arg(version_flag)
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", program, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} {} failed: {:?}",
            program,
            version_flag,
            output.status
        ));
    }
    Ok(())
}

fn ensure_which(program: &str) -> anyhow::Result<()> {
    which::which(program).map_err(|e| anyhow::anyhow!("{} not found on PATH: {}", program, e))?;
    Ok(())
}

fn ensure_file(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        return Err(anyhow::anyhow!("background video {} not found", path.display()));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
