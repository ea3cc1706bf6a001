//! Speech Cache Port - 语音合成结果缓存
//!
//! 内容寻址缓存：key 由 (语言, 规范化文本) 的哈希决定，
//! 相同输入永远命中同一条目。条目永不淘汰（由外部手动清理）。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

/// Speech Cache Port
///
/// lookup 是存在性检查，store 是一次拷贝。
/// 同一 key 的并发写入内容逐字节相同（内容寻址），last-writer-wins 是安全的。
#[async_trait]
pub trait SpeechCachePort: Send + Sync {
    /// 查询缓存条目，命中返回缓存内文件路径
    async fn lookup(&self, key: &str) -> Result<Option<PathBuf>, CacheError>;

    /// 写入缓存条目（幂等：已存在的条目不会被覆盖）
    async fn store(&self, key: &str, artifact: &Path) -> Result<(), CacheError>;
}

/// 生成缓存 key
///
/// md5(语言 + 规范化文本)，十六进制字符串。
/// 相同 (text, language) 恒得相同 key；不同文本以压倒性概率得到不同 key。
pub fn cache_key(text: &str, language: &str) -> String {
    let digest = md5::compute(format!("{}|{}", language, text).as_bytes());
    format!("{:x}", digest)
}
