//! Cache Adapter - 文件系统语音缓存实现

mod fs_cache;

pub use fs_cache::{FsSpeechCache, FsSpeechCacheConfig};
