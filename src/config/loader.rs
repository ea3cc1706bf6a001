//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.yaml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SLIDECAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.yaml 或 config.local.yaml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SLIDECAST_TTS__LANGUAGE=en`
/// - `SLIDECAST_TTS__HTTP_URL=http://tts-server:8000`
/// - `SLIDECAST_VIDEO__RESOLUTION=1280x720`
/// - `SLIDECAST_PERFORMANCE__MAX_WORKERS=8`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("tts.language", "zh-cn")?
        .set_default("tts.cache_enabled", true)?
        .set_default("tts.cache_dir", "data/tts_cache")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_chars_per_request", 500)?
        .set_default("video.resolution", "1920x1080")?
        .set_default("video.frame_rate", 30)?
        .set_default("video.codec", "libx264")?
        .set_default("video.bitrate", "5M")?
        .set_default("video.audio_codec", "aac")?
        .set_default("video.audio_bitrate", "128k")?
        .set_default("video.min_slide_secs", 1.0)?
        .set_default("video.max_slide_secs", 30.0)?
        .set_default("video.default_slide_secs", 3.0)?
        .set_default("video.author", "slidecast")?
        .set_default("script.course_name", "课程")?
        .set_default("paths.output_dir", "data/output")?
        .set_default("paths.temp_dir", "data/temp")?
        .set_default("performance.max_workers", 4)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: SLIDECAST_
    // 层级分隔符: __ (双下划线)
    // 例如: SLIDECAST_TTS__HTTP_URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("SLIDECAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证语言
    if config.tts.language.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS language cannot be empty".to_string(),
        ));
    }

    // 验证超时
    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    if config.tts.max_chars_per_request == 0 {
        return Err(ConfigError::ValidationError(
            "TTS max chars per request cannot be 0".to_string(),
        ));
    }

    // 验证分辨率
    if config.video.dimensions().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Invalid video resolution: {}",
            config.video.resolution
        )));
    }

    if config.video.frame_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Video frame rate cannot be 0".to_string(),
        ));
    }

    // 验证时长策略
    if config.video.min_slide_secs <= 0.0
        || config.video.max_slide_secs < config.video.min_slide_secs
    {
        return Err(ConfigError::ValidationError(format!(
            "Invalid slide duration bounds: min={}, max={}",
            config.video.min_slide_secs, config.video.max_slide_secs
        )));
    }

    // 验证 worker 数
    if config.performance.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "Max workers cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("TTS Language: {}", config.tts.language);
    tracing::info!("TTS Cache: {} ({})",
        if config.tts.cache_enabled { "enabled" } else { "disabled" },
        config.tts.cache_dir.display()
    );
    match &config.tts.http_url {
        Some(url) => tracing::info!("TTS HTTP Service: {}", url),
        None => tracing::info!("TTS HTTP Service: not configured"),
    }
    tracing::info!("Video: {} @{}fps {}", config.video.resolution, config.video.frame_rate, config.video.codec);
    tracing::info!("Slide Duration: {}s - {}s (default {}s)",
        config.video.min_slide_secs, config.video.max_slide_secs, config.video.default_slide_secs
    );
    tracing::info!("Output Directory: {}", config.paths.output_dir.display());
    tracing::info!("Temp Directory: {}", config.paths.temp_dir.display());
    tracing::info!("Max Workers: {}", config.performance.max_workers);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
