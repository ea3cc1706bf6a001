//! Slidecast - 自动化教学课程录制系统
//!
//! Usage:
//!     slidecast deck.json -o output.mp4
//!     slidecast --batch --input-dir ./decks --output-dir ./videos

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use slidecast::application::composer::VideoComposer;
use slidecast::application::pipeline::{DeckPipeline, PipelineReport};
use slidecast::application::resolver::SpeechResolver;
use slidecast::application::scheduler::{BatchSynthesizer, BatchSynthesizerConfig};
use slidecast::config::{load_config, load_config_from_path, print_config, AppConfig};
use slidecast::domain::script::{ScriptGenerator, ScriptGeneratorConfig};
use slidecast::domain::timing::DurationPolicy;
use slidecast::infrastructure::adapters::{
    build_engine_chain, FfmpegEncoderConfig, FfmpegVideoEncoder, FfprobeMediaProbe,
    FsSpeechCache, FsSpeechCacheConfig,
};
use slidecast::infrastructure::deck::load_deck;

/// 命令行参数
#[derive(Parser)]
#[command(
    name = "slidecast",
    version,
    about = "自动化教学课程录制系统 - 将课件清单转换为讲解视频"
)]
struct Cli {
    /// 课件清单路径（JSON）
    deck: Option<PathBuf>,

    /// 输出视频路径
    #[arg(short, long, default_value = "output.mp4")]
    output: PathBuf,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 详细日志输出
    #[arg(short, long)]
    verbose: bool,

    /// 批量处理模式
    #[arg(long)]
    batch: bool,

    /// 批量处理输入目录
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// 批量处理输出目录（默认取配置 paths.output_dir）
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// 批量模式最大并行课件数（默认取配置 performance.max_workers）
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = match &cli.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let level = if cli.verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };
    let log_filter = format!("{},slidecast={}", level, level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Slidecast - 自动化教学课程录制系统");
    print_config(&config);

    // 中断信号 → 取消令牌，在阶段边界协作式停止
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received shutdown signal, stopping at next stage boundary");
                cancel.cancel();
            }
        });
    }

    let pipeline = build_pipeline(&config, cancel.clone()).await?;

    if cli.batch {
        let input_dir = cli
            .input_dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--batch requires --input-dir"))?;
        let output_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| config.paths.output_dir.clone());
        let workers = cli.workers.unwrap_or(config.performance.max_workers).max(1);

        let failed = run_batch(Arc::new(pipeline), &input_dir, &output_dir, workers, cancel).await?;
        if failed > 0 {
            std::process::exit(1);
        }
    } else {
        let deck_path = cli
            .deck
            .clone()
            .ok_or_else(|| anyhow::anyhow!("deck manifest path required (or use --batch)"))?;

        let deck = load_deck(&deck_path).await?;
        let report = pipeline.run(&deck, &cli.output).await?;
        log_report(&report);
    }

    Ok(())
}

/// 按配置装配整条流水线
async fn build_pipeline(
    config: &AppConfig,
    cancel: CancellationToken,
) -> anyhow::Result<DeckPipeline> {
    let engines = build_engine_chain(&config.tts)?;

    let cache = Arc::new(
        FsSpeechCache::new(FsSpeechCacheConfig {
            dir: config.tts.cache_dir.clone(),
            enabled: config.tts.cache_enabled,
        })
        .await?,
    );

    let resolver = Arc::new(SpeechResolver::new(engines, cache));
    let synthesizer = BatchSynthesizer::new(
        resolver,
        BatchSynthesizerConfig {
            max_concurrent: config.performance.max_workers,
        },
    );

    let (width, height) = config
        .video
        .dimensions()
        .ok_or_else(|| anyhow::anyhow!("Invalid video resolution: {}", config.video.resolution))?;

    let encoder = Arc::new(FfmpegVideoEncoder::new(FfmpegEncoderConfig {
        width,
        height,
        frame_rate: config.video.frame_rate,
        video_codec: config.video.codec.clone(),
        video_bitrate: config.video.bitrate.clone(),
        audio_codec: config.video.audio_codec.clone(),
        audio_bitrate: config.video.audio_bitrate.clone(),
        ..Default::default()
    }));
    let probe = Arc::new(FfprobeMediaProbe::with_defaults());

    let composer = VideoComposer::new(
        probe,
        encoder,
        DurationPolicy {
            min_secs: config.video.min_slide_secs,
            max_secs: config.video.max_slide_secs,
            default_secs: config.video.default_slide_secs,
        },
    );

    let generator = ScriptGenerator::new(ScriptGeneratorConfig {
        course_name: config.script.course_name.clone(),
    });

    Ok(DeckPipeline::new(
        generator,
        synthesizer,
        composer,
        config.paths.temp_dir.clone(),
        config.video.author.clone(),
        cancel,
    ))
}

/// 批量处理：输入目录下的每个 *.json 清单产出一个视频
///
/// 返回失败的课件数
async fn run_batch(
    pipeline: Arc<DeckPipeline>,
    input_dir: &Path,
    output_dir: &Path,
    workers: usize,
    cancel: CancellationToken,
) -> anyhow::Result<usize> {
    tokio::fs::create_dir_all(output_dir).await?;

    let mut manifests = Vec::new();
    let mut entries = tokio::fs::read_dir(input_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            manifests.push(path);
        }
    }
    manifests.sort();

    if manifests.is_empty() {
        tracing::warn!(dir = %input_dir.display(), "No deck manifests found");
        return Ok(0);
    }

    tracing::info!(
        decks = manifests.len(),
        workers = workers,
        "Batch processing started"
    );

    // 课件级并行；每套课件在流水线内部有自己的私有工作目录
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(manifests.len());

    for manifest in manifests {
        if cancel.is_cancelled() {
            tracing::info!("Cancellation requested, not starting further decks");
            break;
        }

        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        let output = output_dir
            .join(manifest.file_stem().unwrap_or_default())
            .with_extension("mp4");

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            let result = process_deck(&pipeline, &manifest, &output).await;
            (manifest, result)
        }));
    }

    let total = handles.len();
    let mut success = 0usize;
    let mut failed = 0usize;

    for handle in handles {
        let (manifest, result) = handle.await?;
        match result {
            Ok(report) => {
                success += 1;
                tracing::info!(
                    deck = %manifest.display(),
                    output = %report.video.path.display(),
                    dropped = report.slides_dropped,
                    "✓ Deck completed"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(deck = %manifest.display(), error = %e, "✗ Deck failed");
            }
        }
    }

    tracing::info!(
        total = total,
        success = success,
        failed = failed,
        "Batch processing finished"
    );

    Ok(failed)
}

/// 处理单套课件
async fn process_deck(
    pipeline: &DeckPipeline,
    manifest: &Path,
    output: &Path,
) -> anyhow::Result<PipelineReport> {
    let deck = load_deck(manifest).await?;
    let report = pipeline.run(&deck, output).await?;
    Ok(report)
}

/// 输出运行结果摘要
fn log_report(report: &PipelineReport) {
    tracing::info!(
        output = %report.video.path.display(),
        duration_secs = report.video.duration_secs,
        slides = report.slides_total,
        narrated = report.slides_narrated,
        "Video created"
    );

    if report.slides_dropped > 0 {
        // 部分成功：视频产出，但个别页没有自己的解说
        tracing::warn!(
            dropped = report.slides_dropped,
            "Some slides have no own narration"
        );
    }
}
