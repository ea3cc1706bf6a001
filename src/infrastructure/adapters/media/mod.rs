//! Media Adapters - ffprobe 探测与 ffmpeg 编码实现

mod ffmpeg;
mod ffprobe;

pub use ffmpeg::{FfmpegEncoderConfig, FfmpegVideoEncoder};
pub use ffprobe::{FfprobeMediaProbe, FfprobeMediaProbeConfig};
