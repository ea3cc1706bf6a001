//! Ffmpeg Video Encoder - 片段编码、无损拼接与元数据标注
//!
//! 只用到 ffmpeg 的四种能力：
//! - scale+pad 滤镜（保持宽高比、居中补边）
//! - 固定帧率的定格图片编码（-loop 1 + -t + -shortest）
//! - concat demuxer 清单拼接（-f concat -c copy，不重编码）
//! - 流拷贝重封装加 -metadata

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{EncodeError, VideoEncoderPort, VideoMetadata};

/// ffmpeg 编码配置
#[derive(Debug, Clone)]
pub struct FfmpegEncoderConfig {
    /// 可执行文件名
    pub binary: String,
    /// 目标宽度
    pub width: u32,
    /// 目标高度
    pub height: u32,
    /// 帧率
    pub frame_rate: u32,
    /// 视频编码器
    pub video_codec: String,
    /// 视频码率（如 "5M"）
    pub video_bitrate: String,
    /// 音频编码器
    pub audio_codec: String,
    /// 音频码率（如 "128k"）
    pub audio_bitrate: String,
}

impl Default for FfmpegEncoderConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            width: 1920,
            height: 1080,
            frame_rate: 30,
            video_codec: "libx264".to_string(),
            video_bitrate: "5M".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// ffmpeg 适配器
pub struct FfmpegVideoEncoder {
    config: FfmpegEncoderConfig,
}

impl FfmpegVideoEncoder {
    pub fn new(config: FfmpegEncoderConfig) -> Self {
        Self { config }
    }

    /// 保持宽高比缩放，再居中补黑边到目标分辨率
    fn scale_pad_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black",
            w = self.config.width,
            h = self.config.height,
        )
    }

    /// 运行 ffmpeg，失败时返回 stderr 末尾
    async fn run(&self, args: &[&std::ffi::OsStr]) -> Result<(), String> {
        tracing::debug!(binary = %self.config.binary, ?args, "Running encoder");

        let output = tokio::process::Command::new(&self.config.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.config.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(format!("{} exited with {}: {}", self.config.binary, output.status, tail));
        }

        Ok(())
    }
}

/// concat demuxer 清单里的一行（单引号包裹，内部单引号转义）
fn concat_list_entry(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}

#[async_trait]
impl VideoEncoderPort for FfmpegVideoEncoder {
    async fn render_segment(
        &self,
        image: &Path,
        audio: &Path,
        seconds: f64,
        output: &Path,
    ) -> Result<(), EncodeError> {
        let filter = self.scale_pad_filter();
        let duration = format!("{:.3}", seconds);
        let frame_rate = self.config.frame_rate.to_string();

        let mut args: Vec<&std::ffi::OsStr> = Vec::new();
        for arg in ["-y", "-loop", "1", "-i"] {
            args.push(arg.as_ref());
        }
        args.push(image.as_os_str());
        args.push("-i".as_ref());
        args.push(audio.as_os_str());
        args.push("-t".as_ref());
        args.push(duration.as_ref());
        args.push("-vf".as_ref());
        args.push(filter.as_ref());
        args.push("-r".as_ref());
        args.push(frame_rate.as_ref());
        args.push("-c:v".as_ref());
        args.push(self.config.video_codec.as_ref());
        args.push("-b:v".as_ref());
        args.push(self.config.video_bitrate.as_ref());
        args.push("-pix_fmt".as_ref());
        args.push("yuv420p".as_ref());
        args.push("-c:a".as_ref());
        args.push(self.config.audio_codec.as_ref());
        args.push("-b:a".as_ref());
        args.push(self.config.audio_bitrate.as_ref());
        // 片段不超出自己的音频：以图片时长与音频时长中较短者为准
        args.push("-shortest".as_ref());
        args.push(output.as_os_str());

        self.run(&args).await.map_err(EncodeError::SegmentFailed)
    }

    async fn concat_segments(&self, segments: &[&Path], output: &Path) -> Result<(), EncodeError> {
        let list_path = output.with_extension("txt");
        let mut list = String::new();
        for segment in segments {
            list.push_str(&concat_list_entry(segment));
        }
        tokio::fs::write(&list_path, list).await?;

        let mut args: Vec<&std::ffi::OsStr> = Vec::new();
        for arg in ["-y", "-f", "concat", "-safe", "0", "-i"] {
            args.push(arg.as_ref());
        }
        args.push(list_path.as_os_str());
        // 流拷贝，不重编码
        args.push("-c".as_ref());
        args.push("copy".as_ref());
        args.push(output.as_os_str());

        let result = self.run(&args).await.map_err(EncodeError::ConcatFailed);

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            tracing::warn!(path = %list_path.display(), error = %e, "Failed to remove concat list");
        }

        result
    }

    async fn tag_metadata(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        output: &Path,
    ) -> Result<(), EncodeError> {
        let title = format!("title={}", metadata.title);
        let artist = format!("artist={}", metadata.author);
        let creation_time = metadata
            .created_at
            .map(|t| format!("creation_time={}", t.to_rfc3339()));

        let mut args: Vec<&std::ffi::OsStr> = Vec::new();
        args.push("-y".as_ref());
        args.push("-i".as_ref());
        args.push(video.as_os_str());
        args.push("-c".as_ref());
        args.push("copy".as_ref());
        args.push("-metadata".as_ref());
        args.push(title.as_ref());
        args.push("-metadata".as_ref());
        args.push(artist.as_ref());
        if let Some(creation_time) = &creation_time {
            args.push("-metadata".as_ref());
            args.push(creation_time.as_ref());
        }
        args.push(output.as_os_str());

        self.run(&args).await.map_err(EncodeError::MetadataFailed)
    }
}
