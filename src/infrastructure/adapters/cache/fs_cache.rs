//! File System Speech Cache - 目录式内容寻址缓存
//!
//! 缓存目录里每个条目一个音频文件，文件名就是缓存 key。
//! lookup 是存在性检查，store 是一次拷贝，永不淘汰。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{CacheError, SpeechCachePort};

/// 文件系统缓存配置
#[derive(Debug, Clone)]
pub struct FsSpeechCacheConfig {
    /// 缓存根目录
    pub dir: PathBuf,
    /// 是否启用（禁用时 lookup/store 都是 no-op）
    pub enabled: bool,
}

/// 文件系统语音缓存
pub struct FsSpeechCache {
    config: FsSpeechCacheConfig,
}

impl FsSpeechCache {
    /// 创建缓存（启用时确保目录存在）
    pub async fn new(config: FsSpeechCacheConfig) -> Result<Self, CacheError> {
        if config.enabled {
            fs::create_dir_all(&config.dir).await?;
        }
        Ok(Self { config })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.config.dir.join(format!("{}.wav", key))
    }
}

#[async_trait]
impl SpeechCachePort for FsSpeechCache {
    async fn lookup(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
        if !self.config.enabled {
            return Ok(None);
        }

        let path = self.entry_path(key);
        if path.exists() {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    async fn store(&self, key: &str, artifact: &Path) -> Result<(), CacheError> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.entry_path(key);

        // 同一 key 意味着同一文本，已有条目无需也不应被覆盖
        if path.exists() {
            tracing::debug!(key = %key, "Cache entry already present");
            return Ok(());
        }

        fs::copy(artifact, &path).await?;
        tracing::debug!(key = %key, path = %path.display(), "Audio cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn cache_in(dir: &Path, enabled: bool) -> FsSpeechCache {
        FsSpeechCache::new(FsSpeechCacheConfig {
            dir: dir.join("cache"),
            enabled,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let temp = tempdir().unwrap();
        let cache = cache_in(temp.path(), true).await;

        let artifact = temp.path().join("a.wav");
        std::fs::write(&artifact, b"audio bytes").unwrap();

        assert!(cache.lookup("abc123").await.unwrap().is_none());
        cache.store("abc123", &artifact).await.unwrap();

        let hit = cache.lookup("abc123").await.unwrap().unwrap();
        assert_eq!(std::fs::read(hit).unwrap(), b"audio bytes");
    }

    #[tokio::test]
    async fn test_store_is_idempotent_and_never_overwrites() {
        let temp = tempdir().unwrap();
        let cache = cache_in(temp.path(), true).await;

        let first = temp.path().join("first.wav");
        let second = temp.path().join("second.wav");
        std::fs::write(&first, b"original").unwrap();
        std::fs::write(&second, b"different").unwrap();

        cache.store("key", &first).await.unwrap();
        cache.store("key", &second).await.unwrap();

        let hit = cache.lookup("key").await.unwrap().unwrap();
        assert_eq!(std::fs::read(hit).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let temp = tempdir().unwrap();
        let cache = cache_in(temp.path(), false).await;

        let artifact = temp.path().join("a.wav");
        std::fs::write(&artifact, b"audio").unwrap();

        cache.store("key", &artifact).await.unwrap();
        assert!(cache.lookup("key").await.unwrap().is_none());
        // 禁用时不创建目录
        assert!(!temp.path().join("cache").exists());
    }
}
