//! Media Ports - 媒体探测与视频编码抽象
//!
//! 核心只依赖四种外部编码能力：缩放补边、固定帧率片段编码、
//! 按清单无损拼接、流拷贝加元数据。具体工具（ffmpeg/ffprobe）在适配器层。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// 媒体探测错误
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to run probe tool: {0}")]
    Spawn(String),

    #[error("Probe failed: {0}")]
    Failed(String),

    #[error("Failed to parse probe output: {0}")]
    Parse(String),
}

/// 视频编码错误
#[derive(Debug, Error)]
pub enum EncodeError {
    /// 单个片段编码失败（对整次运行是致命的）
    #[error("Segment encode failed: {0}")]
    SegmentFailed(String),

    #[error("Concat failed: {0}")]
    ConcatFailed(String),

    #[error("Metadata tagging failed: {0}")]
    MetadataFailed(String),

    /// 产物缺失或为空
    #[error("Output missing or empty: {0}")]
    OutputMissing(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err.to_string())
    }
}

/// 视频元数据
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// 标题
    pub title: String,
    /// 作者
    pub author: String,
    /// 创建时间（未提供时由调用方以当前时间补齐）
    pub created_at: Option<DateTime<Utc>>,
}

/// Media Probe Port
///
/// 读取媒体文件的真实解码时长，是幻灯片计时的唯一事实来源
#[async_trait]
pub trait MediaProbePort: Send + Sync {
    /// 媒体时长（秒）
    async fn media_duration_secs(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Video Encoder Port
///
/// 片段编码 + 无损拼接 + 元数据标注
#[async_trait]
pub trait VideoEncoderPort: Send + Sync {
    /// 渲染单页片段：静止图片保持 seconds 秒，缩放补边到目标分辨率，混入音频。
    /// 片段时长以图片时长与音频时长中较短者为准（片段不会超出自己的音频）。
    async fn render_segment(
        &self,
        image: &Path,
        audio: &Path,
        seconds: f64,
        output: &Path,
    ) -> Result<(), EncodeError>;

    /// 按顺序无损拼接片段（流拷贝，不重编码）
    async fn concat_segments(&self, segments: &[&Path], output: &Path) -> Result<(), EncodeError>;

    /// 流拷贝重封装并写入元数据
    async fn tag_metadata(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        output: &Path,
    ) -> Result<(), EncodeError>;
}
