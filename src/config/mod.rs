//! Configuration - 配置模块
//!
//! - types: 配置结构体定义
//! - loader: 多源配置加载（默认值 → YAML 文件 → 环境变量）

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AppConfig, LogConfig, PathsConfig, PerformanceConfig, ScriptConfig, TtsConfig, VideoConfig,
};
