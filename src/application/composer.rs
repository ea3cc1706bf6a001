//! Video Composer - 时长计算、片段编码与最终装配
//!
//! 三个串行步骤（都依赖完整有序的音频集，不做并发）：
//! 1. 时长计算：探测每页音频的真实时长并收敛上下限
//! 2. 片段编码：每页一段，图片定格 + 音频混流；单段失败即整次运行失败
//! 3. 装配：按清单无损拼接 + 元数据标注，产物必须存在且非空

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::application::error::PipelineError;
use crate::application::ports::{MediaProbePort, VideoEncoderPort, VideoMetadata};
use crate::domain::deck::{FinalVideo, SlideAssetPair, VideoSegment};
use crate::domain::timing::{DurationPolicy, SlideDuration};

/// 视频装配器
pub struct VideoComposer {
    probe: Arc<dyn MediaProbePort>,
    encoder: Arc<dyn VideoEncoderPort>,
    policy: DurationPolicy,
}

impl VideoComposer {
    pub fn new(
        probe: Arc<dyn MediaProbePort>,
        encoder: Arc<dyn VideoEncoderPort>,
        policy: DurationPolicy,
    ) -> Self {
        Self {
            probe,
            encoder,
            policy,
        }
    }

    /// 计算每页展示时长
    ///
    /// 以音频实测时长为唯一事实来源；探测失败退回默认时长而不是中断
    pub async fn durations(&self, pairs: &[SlideAssetPair]) -> Vec<SlideDuration> {
        let mut durations = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let measured = match self.probe.media_duration_secs(&pair.audio).await {
                Ok(secs) => Some(secs),
                Err(e) => {
                    tracing::warn!(
                        page = pair.page,
                        audio = %pair.audio.display(),
                        error = %e,
                        "Failed to probe audio duration, using default"
                    );
                    None
                }
            };

            let seconds = self.policy.clamp(measured);
            tracing::debug!(page = pair.page, seconds = seconds, "Slide duration");
            durations.push(SlideDuration {
                page: pair.page,
                seconds,
            });
        }

        durations
    }

    /// 把对齐后的素材装配成最终视频
    pub async fn compose(
        &self,
        pairs: &[SlideAssetPair],
        work_dir: &Path,
        output: &Path,
        metadata: &VideoMetadata,
    ) -> Result<FinalVideo, PipelineError> {
        let durations = self.durations(pairs).await;

        // 片段编码：每页一段，顺序执行；单段失败即中止
        let mut segments: Vec<VideoSegment> = Vec::with_capacity(pairs.len());
        for (pair, duration) in pairs.iter().zip(&durations) {
            let segment_path = work_dir.join(format!("segment_{:03}.mp4", pair.page));

            self.encoder
                .render_segment(&pair.image, &pair.audio, duration.seconds, &segment_path)
                .await?;

            tracing::debug!(
                page = pair.page,
                seconds = duration.seconds,
                "Segment rendered"
            );
            segments.push(VideoSegment {
                page: pair.page,
                path: segment_path,
                seconds: duration.seconds,
            });
        }

        // 无损拼接
        let combined = work_dir.join("combined.mp4");
        let segment_paths: Vec<&Path> = segments.iter().map(|s| s.path.as_path()).collect();
        self.encoder.concat_segments(&segment_paths, &combined).await?;

        // 元数据标注（创建时间缺省为当前时间）
        let metadata = VideoMetadata {
            title: metadata.title.clone(),
            author: metadata.author.clone(),
            created_at: Some(metadata.created_at.unwrap_or_else(Utc::now)),
        };
        self.encoder.tag_metadata(&combined, &metadata, output).await?;

        // 后置条件：产物存在且非空
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => {
                return Err(PipelineError::Assembly(format!(
                    "output file is empty: {}",
                    output.display()
                )));
            }
            Err(e) => {
                return Err(PipelineError::Assembly(format!(
                    "output file missing: {}: {}",
                    output.display(),
                    e
                )));
            }
        }

        let duration_secs = match self.probe.media_duration_secs(output).await {
            Ok(secs) => secs,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to probe final video, summing segment durations");
                segments.iter().map(|s| s.seconds).sum()
            }
        };

        // 临时片段清理是尽力而为的，失败只记日志
        for segment in &segments {
            if let Err(e) = tokio::fs::remove_file(&segment.path).await {
                tracing::warn!(path = %segment.path.display(), error = %e, "Failed to remove segment");
            }
        }
        if let Err(e) = tokio::fs::remove_file(&combined).await {
            tracing::warn!(path = %combined.display(), error = %e, "Failed to remove combined video");
        }

        tracing::info!(
            output = %output.display(),
            segments = segments.len(),
            duration_secs = duration_secs,
            "Video assembled"
        );

        Ok(FinalVideo {
            path: output.to_path_buf(),
            title: metadata.title,
            duration_secs,
        })
    }
}
