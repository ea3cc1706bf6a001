//! 基础设施层
//!
//! 六边形架构的适配器实现：
//! - adapters/tts: 语音合成引擎（本地命令行 + 网络服务）
//! - adapters/cache: 文件系统语音缓存
//! - adapters/media: ffprobe 探测与 ffmpeg 编码
//! - deck: 课件清单加载

pub mod adapters;
pub mod deck;
