use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use tracing::{error, info};

use video_dubber::config::Config;
use video_dubber::fetch::YtDlpFetcher;
use video_dubber::job::{JobOrchestrator, JobOutcome, JobSource, ProgressSink, Stage};
use video_dubber::media::FfmpegToolkit;
use video_dubber::services::create_services;

/// Progress sink for one-shot CLI runs: stage labels go straight to the log.
struct LogProgress;

#[async_trait]
impl ProgressSink for LogProgress {
    async fn stage_started(&self, job_id: &str, stage: Stage) {
        info!("⏳ [{}] {}", job_id, stage.label());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("video_dubber=info,warn")
        .init();

    let matches = Command::new("Video Dubber")
        .version("0.1.0")
        .about("Dub a video into another language: transcribe, translate, synthesize, re-mux")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Local video file to dub"),
        )
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Remote video URL to fetch and dub"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("CODE")
                .help("Target language code (e.g. es, fr, de)")
                .default_value("en"),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Run the HTTP API server instead of a one-shot job")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    config.validate()?;

    let services = create_services(&config)?;
    let fetcher = Arc::new(YtDlpFetcher::new(config.fetch.clone()));
    let media = Arc::new(FfmpegToolkit::new());

    if matches.get_flag("serve") {
        return serve(config, media, services, fetcher).await;
    }

    let target_language = matches.get_one::<String>("language").unwrap().clone();
    let source = match (
        matches.get_one::<String>("input"),
        matches.get_one::<String>("url"),
    ) {
        (Some(path), None) => JobSource::Upload(path.into()),
        (None, Some(url)) => JobSource::Url(url.clone()),
        _ => {
            error!("Provide exactly one of --input or --url (or --serve)");
            return Err(anyhow::anyhow!("no source given"));
        }
    };

    let orchestrator = JobOrchestrator::new(
        media,
        services,
        fetcher,
        Arc::new(LogProgress),
        &config,
    );

    let job_id = uuid::Uuid::new_v4().to_string();
    info!("🎬 Dubbing into '{}' (job {})", target_language, job_id);

    match orchestrator.run(&job_id, source, &target_language).await {
        JobOutcome::Succeeded { output } => {
            info!("🎉 Output written to {}", output.display());
            Ok(())
        }
        JobOutcome::NoSpeech { message } => {
            info!("ℹ️ {}", message);
            Ok(())
        }
        JobOutcome::Failed { message } => {
            error!("❌ {}", message);
            Err(anyhow::anyhow!(message))
        }
    }
}

#[cfg(feature = "api")]
async fn serve(
    config: Config,
    media: Arc<FfmpegToolkit>,
    services: video_dubber::services::ServiceHandles,
    fetcher: Arc<YtDlpFetcher>,
) -> Result<()> {
    use video_dubber::registry::JobRegistry;

    let registry = Arc::new(JobRegistry::new());
    let orchestrator = Arc::new(JobOrchestrator::new(
        media,
        services,
        fetcher,
        registry.clone(),
        &config,
    ));

    video_dubber::api::start_http_server(registry, orchestrator, Arc::new(config)).await
}

#[cfg(not(feature = "api"))]
async fn serve(
    _config: Config,
    _media: Arc<FfmpegToolkit>,
    _services: video_dubber::services::ServiceHandles,
    _fetcher: Arc<YtDlpFetcher>,
) -> Result<()> {
    Err(anyhow::anyhow!(
        "built without the 'api' feature; rebuild with --features api to serve HTTP"
    ))
}
