//! Deck Pipeline - 整条流水线编排
//!
//! 阶段：讲稿生成 → 批量合成 → 对齐 → 装配。
//! 取消是协作式的：只在阶段边界检查取消令牌，
//! 不会强杀正在执行的外部进程调用（这也做不到）。
//! 每次运行有独立的 uuid 工作目录，批量模式下多套课件并行互不干扰。

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::composer::VideoComposer;
use crate::application::error::PipelineError;
use crate::application::ports::VideoMetadata;
use crate::application::scheduler::{align_to_slides, BatchSynthesizer};
use crate::domain::deck::{Deck, FinalVideo};
use crate::domain::script::ScriptGenerator;

/// 流水线运行结果
///
/// 部分成功（视频产出、个别页无解说）算成功，丢弃数作为告警计数上报
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// 总页数
    pub slides_total: usize,
    /// 成功配音的页数
    pub slides_narrated: usize,
    /// 合成失败被丢弃的讲稿单元数
    pub slides_dropped: usize,
    /// 最终视频
    pub video: FinalVideo,
}

/// 课件流水线
pub struct DeckPipeline {
    generator: ScriptGenerator,
    synthesizer: BatchSynthesizer,
    composer: VideoComposer,
    /// 临时工作目录根，每次运行在其下创建私有子目录
    temp_root: PathBuf,
    /// 元数据作者字段
    author: String,
    cancel: CancellationToken,
}

impl DeckPipeline {
    pub fn new(
        generator: ScriptGenerator,
        synthesizer: BatchSynthesizer,
        composer: VideoComposer,
        temp_root: PathBuf,
        author: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            composer,
            temp_root,
            author,
            cancel,
        }
    }

    /// 处理一套课件，产出一个视频
    pub async fn run(&self, deck: &Deck, output: &Path) -> Result<PipelineReport, PipelineError> {
        if deck.slides.is_empty() {
            return Err(PipelineError::EmptyDeck);
        }

        // 阶段 1：讲稿生成
        self.ensure_not_cancelled()?;
        let units = self.generator.generate(&deck.slides);
        tracing::info!(
            deck = %deck.title,
            slides = deck.slides.len(),
            units = units.len(),
            "Script generated"
        );

        // 每次运行的私有工作目录
        let run_dir = self.temp_root.join(format!("run-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&run_dir).await?;

        let result = self.run_in_dir(deck, units, &run_dir, output).await;

        // 工作目录清理是尽力而为的
        if let Err(e) = tokio::fs::remove_dir_all(&run_dir).await {
            tracing::warn!(dir = %run_dir.display(), error = %e, "Failed to remove run directory");
        }

        result
    }

    async fn run_in_dir(
        &self,
        deck: &Deck,
        units: Vec<crate::domain::deck::ScriptUnit>,
        run_dir: &Path,
        output: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        let unit_count = units.len();

        // 阶段 2：批量合成
        self.ensure_not_cancelled()?;
        let artifacts = self
            .synthesizer
            .synthesize_all(&units, &deck.language, run_dir)
            .await;

        if artifacts.is_empty() {
            return Err(PipelineError::NoNarration);
        }

        // 阶段 3：对齐（保证每页恰好一个音频）
        self.ensure_not_cancelled()?;
        let pairs = align_to_slides(&artifacts, &deck.slides);

        // 阶段 4：装配
        self.ensure_not_cancelled()?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let metadata = VideoMetadata {
            title: deck.title.clone(),
            author: self.author.clone(),
            created_at: None,
        };
        let video = self.composer.compose(&pairs, run_dir, output, &metadata).await?;

        let dropped = unit_count.saturating_sub(artifacts.len());
        if dropped > 0 {
            tracing::warn!(
                deck = %deck.title,
                dropped = dropped,
                "Deck finished with silent slides"
            );
        }

        Ok(PipelineReport {
            slides_total: deck.slides.len(),
            slides_narrated: artifacts.len(),
            slides_dropped: dropped,
            video,
        })
    }

    fn ensure_not_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            tracing::info!("Cancellation requested, stopping at stage boundary");
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::tempdir;

    use crate::application::ports::{
        EncodeError, MediaProbePort, ProbeError, SpeechCachePort, SpeechEnginePort, SpeechError,
        SynthesisRequest, VideoEncoderPort,
    };
    use crate::application::resolver::SpeechResolver;
    use crate::application::scheduler::BatchSynthesizerConfig;
    use crate::domain::deck::Slide;
    use crate::domain::timing::DurationPolicy;
    use crate::infrastructure::adapters::tts::wav;
    use crate::infrastructure::adapters::{FakeSpeechEngine, FakeSpeechEngineConfig};

    /// 按文本内容决定成败的引擎（含"不稳定页"场景）
    struct SelectiveEngine {
        fail_marker: &'static str,
    }

    #[async_trait]
    impl SpeechEnginePort for SelectiveEngine {
        async fn synthesize(
            &self,
            request: &SynthesisRequest,
            output_path: &std::path::Path,
        ) -> Result<(), SpeechError> {
            if request.text.contains(self.fail_marker) {
                return Err(SpeechError::Service("scripted failure".to_string()));
            }
            let format = wav::WavFormat {
                channels: 1,
                sample_rate: 16000,
                bits_per_sample: 16,
            };
            let pcm = wav::silence_pcm(&format, 1000);
            tokio::fs::write(output_path, wav::write_wav(&format, &pcm)).await?;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "selective"
        }
    }

    /// 禁用掉的缓存（测试里每次都走引擎）
    struct NullCache;

    #[async_trait]
    impl SpeechCachePort for NullCache {
        async fn lookup(
            &self,
            _key: &str,
        ) -> Result<Option<PathBuf>, crate::application::ports::CacheError> {
            Ok(None)
        }

        async fn store(
            &self,
            _key: &str,
            _artifact: &Path,
        ) -> Result<(), crate::application::ports::CacheError> {
            Ok(())
        }
    }

    /// 从 WAV 头算真实时长的假探测器
    struct WavProbe;

    #[async_trait]
    impl MediaProbePort for WavProbe {
        async fn media_duration_secs(&self, path: &Path) -> Result<f64, ProbeError> {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| ProbeError::Failed(e.to_string()))?;
            let parsed =
                wav::parse_wav(&data).map_err(|e| ProbeError::Parse(e.to_string()))?;
            let byte_rate = parsed.format.sample_rate as usize
                * parsed.format.channels as usize
                * (parsed.format.bits_per_sample / 8) as usize;
            Ok(parsed.pcm.len() as f64 / byte_rate as f64)
        }
    }

    /// 落盘占位文件的假编码器
    struct StubEncoder;

    #[async_trait]
    impl VideoEncoderPort for StubEncoder {
        async fn render_segment(
            &self,
            _image: &Path,
            _audio: &Path,
            _seconds: f64,
            output: &Path,
        ) -> Result<(), EncodeError> {
            tokio::fs::write(output, b"segment").await?;
            Ok(())
        }

        async fn concat_segments(
            &self,
            segments: &[&Path],
            output: &Path,
        ) -> Result<(), EncodeError> {
            let mut data = Vec::new();
            for segment in segments {
                data.extend(tokio::fs::read(segment).await?);
            }
            tokio::fs::write(output, data).await?;
            Ok(())
        }

        async fn tag_metadata(
            &self,
            video: &Path,
            _metadata: &VideoMetadata,
            output: &Path,
        ) -> Result<(), EncodeError> {
            tokio::fs::copy(video, output).await?;
            Ok(())
        }
    }

    fn test_deck(pages: &[(u32, &str)]) -> Deck {
        Deck {
            title: "测试课件".to_string(),
            language: "zh-cn".to_string(),
            slides: pages
                .iter()
                .map(|(page, body)| Slide {
                    page: *page,
                    title: format!("第{}节", page),
                    body: vec![body.to_string()],
                    image: PathBuf::from(format!("slide_{:03}.png", page)),
                })
                .collect(),
        }
    }

    fn pipeline_with(
        engines: Vec<Arc<dyn SpeechEnginePort>>,
        temp_root: PathBuf,
        cancel: CancellationToken,
    ) -> DeckPipeline {
        let resolver = Arc::new(SpeechResolver::new(engines, Arc::new(NullCache)));
        let synthesizer = BatchSynthesizer::new(resolver, BatchSynthesizerConfig::default());
        let composer = VideoComposer::new(
            Arc::new(WavProbe),
            Arc::new(StubEncoder),
            DurationPolicy::default(),
        );
        DeckPipeline::new(
            ScriptGenerator::default(),
            synthesizer,
            composer,
            temp_root,
            "slidecast".to_string(),
            cancel,
        )
    }

    #[tokio::test]
    async fn test_full_run_produces_video_and_report() {
        let temp = tempdir().unwrap();
        let engine = Arc::new(FakeSpeechEngine::new(FakeSpeechEngineConfig::default()));
        let pipeline = pipeline_with(
            vec![engine.clone()],
            temp.path().to_path_buf(),
            CancellationToken::new(),
        );

        let deck = test_deck(&[(1, "二叉树基础"), (2, "遍历方法"), (3, "应用场景")]);
        let output = temp.path().join("out/course.mp4");
        let report = pipeline.run(&deck, &output).await.unwrap();

        assert_eq!(report.slides_total, 3);
        assert_eq!(report.slides_narrated, 3);
        assert_eq!(report.slides_dropped, 0);
        assert!(output.exists());
        assert_eq!(engine.call_count(), 3);

        // 运行目录已清理
        let leftover = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("run-"))
            .count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_still_produces_video() {
        let temp = tempdir().unwrap();
        let engine = Arc::new(SelectiveEngine {
            fail_marker: "不稳定",
        });
        let pipeline = pipeline_with(
            vec![engine],
            temp.path().to_path_buf(),
            CancellationToken::new(),
        );

        // 5 页里 2 页的文本会让引擎失败
        let deck = test_deck(&[
            (1, "正常内容一"),
            (2, "不稳定内容"),
            (3, "正常内容二"),
            (4, "不稳定内容"),
            (5, "正常内容三"),
        ]);
        let output = temp.path().join("course.mp4");
        let report = pipeline.run(&deck, &output).await.unwrap();

        // 部分成功仍是成功：视频产出，丢弃数作为告警计数
        assert_eq!(report.slides_total, 5);
        assert_eq!(report.slides_narrated, 3);
        assert_eq!(report.slides_dropped, 2);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_all_units_failing_is_no_narration() {
        let temp = tempdir().unwrap();
        let engine = Arc::new(FakeSpeechEngine::new(FakeSpeechEngineConfig {
            fail: true,
            ..Default::default()
        }));
        let pipeline = pipeline_with(
            vec![engine],
            temp.path().to_path_buf(),
            CancellationToken::new(),
        );

        let deck = test_deck(&[(1, "内容")]);
        let output = temp.path().join("course.mp4");
        let result = pipeline.run(&deck, &output).await;

        assert!(matches!(result, Err(PipelineError::NoNarration)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_empty_deck_rejected() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline_with(
            vec![Arc::new(FakeSpeechEngine::with_defaults())],
            temp.path().to_path_buf(),
            CancellationToken::new(),
        );

        let deck = Deck {
            title: "空".to_string(),
            language: "zh-cn".to_string(),
            slides: Vec::new(),
        };
        let result = pipeline.run(&deck, &temp.path().join("out.mp4")).await;
        assert!(matches!(result, Err(PipelineError::EmptyDeck)));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_at_stage_boundary() {
        let temp = tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let engine = Arc::new(FakeSpeechEngine::with_defaults());
        let pipeline = pipeline_with(vec![engine.clone()], temp.path().to_path_buf(), cancel);

        let deck = test_deck(&[(1, "内容")]);
        let result = pipeline.run(&deck, &temp.path().join("out.mp4")).await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
        // 在第一个阶段边界就停下，没有引擎被调用
        assert_eq!(engine.call_count(), 0);
    }
}
