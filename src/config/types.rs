//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// TTS 配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 视频配置
    #[serde(default)]
    pub video: VideoConfig,

    /// 脚本生成配置
    #[serde(default)]
    pub script: ScriptConfig,

    /// 路径配置
    #[serde(default)]
    pub paths: PathsConfig,

    /// 性能配置
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 讲解语言（课件清单未指定时的默认值）
    #[serde(default = "default_language")]
    pub language: String,

    /// 是否启用合成结果缓存
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// 缓存目录
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// 外部 TTS HTTP 服务地址（未配置时跳过该引擎）
    #[serde(default)]
    pub http_url: Option<String>,

    /// 网络请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// HTTP 引擎单次请求的文本长度上限（字符数）
    #[serde(default = "default_max_chars")]
    pub max_chars_per_request: usize,
}

fn default_language() -> String {
    "zh-cn".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/tts_cache")
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_max_chars() -> usize {
    500
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            cache_enabled: default_cache_enabled(),
            cache_dir: default_cache_dir(),
            http_url: None,
            timeout_secs: default_tts_timeout(),
            max_chars_per_request: default_max_chars(),
        }
    }
}

/// 视频配置
#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    /// 分辨率，格式 "宽x高"
    #[serde(default = "default_resolution")]
    pub resolution: String,

    /// 帧率
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// 视频编码器
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// 视频码率
    #[serde(default = "default_video_bitrate")]
    pub bitrate: String,

    /// 音频编码器
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// 音频码率
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// 单页最短展示时长（秒）
    #[serde(default = "default_min_slide_secs")]
    pub min_slide_secs: f64,

    /// 单页最长展示时长（秒）
    #[serde(default = "default_max_slide_secs")]
    pub max_slide_secs: f64,

    /// 音频缺失时的默认展示时长（秒）
    #[serde(default = "default_slide_secs")]
    pub default_slide_secs: f64,

    /// 元数据作者字段
    #[serde(default = "default_author")]
    pub author: String,
}

fn default_resolution() -> String {
    "1920x1080".to_string()
}

fn default_frame_rate() -> u32 {
    30
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_video_bitrate() -> String {
    "5M".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_min_slide_secs() -> f64 {
    1.0
}

fn default_max_slide_secs() -> f64 {
    30.0
}

fn default_slide_secs() -> f64 {
    3.0
}

fn default_author() -> String {
    "slidecast".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            frame_rate: default_frame_rate(),
            codec: default_video_codec(),
            bitrate: default_video_bitrate(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            min_slide_secs: default_min_slide_secs(),
            max_slide_secs: default_max_slide_secs(),
            default_slide_secs: default_slide_secs(),
            author: default_author(),
        }
    }
}

impl VideoConfig {
    /// 解析分辨率字符串为 (宽, 高)
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.resolution.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    }
}

/// 脚本生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// 课程名称（开场白兜底）
    #[serde(default = "default_course_name")]
    pub course_name: String,
}

fn default_course_name() -> String {
    "课程".to_string()
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            course_name: default_course_name(),
        }
    }
}

/// 路径配置
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// 输出目录（批量模式）
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 临时工作目录根
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/temp")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

/// 性能配置
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    /// 最大并发 worker 数（合成单元并发、批量模式课件并发共用）
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    4
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tts.language, "zh-cn");
        assert!(config.tts.cache_enabled);
        assert_eq!(config.video.resolution, "1920x1080");
        assert_eq!(config.video.frame_rate, 30);
        assert_eq!(config.performance.max_workers, 4);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_dimensions_parsing() {
        let config = VideoConfig::default();
        assert_eq!(config.dimensions(), Some((1920, 1080)));

        let mut config = VideoConfig::default();
        config.resolution = "1280x720".to_string();
        assert_eq!(config.dimensions(), Some((1280, 720)));

        config.resolution = "not-a-resolution".to_string();
        assert_eq!(config.dimensions(), None);
    }

    #[test]
    fn test_duration_defaults_match_policy() {
        let config = VideoConfig::default();
        assert_eq!(config.min_slide_secs, 1.0);
        assert_eq!(config.max_slide_secs, 30.0);
        assert_eq!(config.default_slide_secs, 3.0);
    }
}
