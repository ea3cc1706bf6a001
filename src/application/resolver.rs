//! Speech Resolver - 单段文本的合成解析
//!
//! 每次 resolve 的状态机：
//! START → CACHE_CHECK → (命中: DONE) | (未命中: ENGINE_TRY)
//! ENGINE_TRY 按固定优先级遍历引擎链，首个成功 → CACHE_STORE → DONE，
//! 链耗尽 → FAILED（返回 None，由批量调度器决定丢弃该页）。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{
    cache_key, SpeechCachePort, SpeechEnginePort, SpeechError, SynthesisRequest,
};
use crate::domain::text::normalize_for_speech;

/// Speech Resolver
///
/// 缓存查询、引擎回退、缓存回填的编排者，是"每段文本"粒度的合成工作单元
pub struct SpeechResolver {
    engines: Vec<Arc<dyn SpeechEnginePort>>,
    cache: Arc<dyn SpeechCachePort>,
}

impl SpeechResolver {
    pub fn new(engines: Vec<Arc<dyn SpeechEnginePort>>, cache: Arc<dyn SpeechCachePort>) -> Self {
        Self { engines, cache }
    }

    /// 把一段文本解析为音频文件
    ///
    /// 成功返回 output_path；全部引擎失败返回 None。
    /// 剥离标记后为空的文本直接返回 None：没有可合成的内容，
    /// 不触碰缓存、不调用任何引擎。
    pub async fn resolve(
        &self,
        text: &str,
        language: &str,
        output_path: &Path,
    ) -> Option<PathBuf> {
        let normalized = normalize_for_speech(text);
        if normalized.is_empty() {
            tracing::debug!("Nothing to synthesize after marker stripping");
            return None;
        }

        let key = cache_key(&normalized, language);

        // CACHE_CHECK
        match self.cache.lookup(&key).await {
            Ok(Some(cached)) => match tokio::fs::copy(&cached, output_path).await {
                Ok(_) => {
                    tracing::debug!(key = %key, "Speech cache hit");
                    return Some(output_path.to_path_buf());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to copy cached audio, re-synthesizing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed, falling back to engines");
            }
        }

        // ENGINE_TRY
        let request = SynthesisRequest {
            text: normalized,
            language: language.to_string(),
        };

        for engine in &self.engines {
            if !engine.is_available().await {
                tracing::debug!(engine = engine.name(), "Engine unavailable, skipping");
                continue;
            }

            match engine.synthesize(&request, output_path).await {
                Ok(()) => {
                    tracing::info!(
                        engine = engine.name(),
                        text_chars = request.text.chars().count(),
                        "Speech synthesized"
                    );

                    // CACHE_STORE：回填失败不影响本次结果
                    if let Err(e) = self.cache.store(&key, output_path).await {
                        tracing::warn!(key = %key, error = %e, "Failed to store audio in cache");
                    }

                    return Some(output_path.to_path_buf());
                }
                Err(SpeechError::Unavailable(reason)) => {
                    tracing::debug!(engine = engine.name(), reason = %reason, "Engine skipped");
                }
                Err(e) => {
                    tracing::warn!(engine = engine.name(), error = %e, "Engine failed, trying next");
                }
            }
        }

        tracing::error!(
            text_chars = request.text.chars().count(),
            "All speech engines failed"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    use crate::application::ports::CacheError;

    /// 脚本化的测试引擎：可配置可用性、成败与产出内容，并记录调用次数
    struct ScriptedEngine {
        name: &'static str,
        available: bool,
        succeed: bool,
        payload: &'static [u8],
        calls: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(name: &'static str, available: bool, succeed: bool, payload: &'static [u8]) -> Self {
            Self {
                name,
                available,
                succeed,
                payload,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechEnginePort for ScriptedEngine {
        async fn synthesize(
            &self,
            _request: &SynthesisRequest,
            output_path: &Path,
        ) -> Result<(), SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                tokio::fs::write(output_path, self.payload).await?;
                Ok(())
            } else {
                Err(SpeechError::Service("scripted failure".to_string()))
            }
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    /// 目录缓存的极简测试实现
    struct DirCache {
        dir: PathBuf,
    }

    #[async_trait]
    impl SpeechCachePort for DirCache {
        async fn lookup(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
            let path = self.dir.join(format!("{}.wav", key));
            Ok(path.exists().then_some(path))
        }

        async fn store(&self, key: &str, artifact: &Path) -> Result<(), CacheError> {
            let path = self.dir.join(format!("{}.wav", key));
            if !path.exists() {
                tokio::fs::copy(artifact, &path).await?;
            }
            Ok(())
        }
    }

    fn resolver_with(
        engines: Vec<Arc<dyn SpeechEnginePort>>,
        cache_dir: &Path,
    ) -> SpeechResolver {
        SpeechResolver::new(
            engines,
            Arc::new(DirCache {
                dir: cache_dir.to_path_buf(),
            }),
        )
    }

    #[tokio::test]
    async fn test_empty_text_returns_none_without_engine_calls() {
        let temp = tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::new("a", true, true, b"audio"));
        let resolver = resolver_with(vec![engine.clone()], temp.path());

        let out = temp.path().join("out.wav");
        assert!(resolver.resolve("  {pause} ", "zh-cn", &out).await.is_none());
        assert_eq!(engine.call_count(), 0);
        // 缓存目录未被触碰
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let first = Arc::new(ScriptedEngine::new("first", true, true, b"first"));
        let second = Arc::new(ScriptedEngine::new("second", true, true, b"second"));
        let resolver = resolver_with(vec![first.clone(), second.clone()], &cache_dir);

        let out = temp.path().join("out.wav");
        let result = resolver.resolve("你好。", "zh-cn", &out).await;

        assert_eq!(result, Some(out.clone()));
        assert_eq!(std::fs::read(&out).unwrap(), b"first");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_engine_skipped_then_fallback_succeeds() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let offline = Arc::new(ScriptedEngine::new("offline", false, true, b"x"));
        let online = Arc::new(ScriptedEngine::new("online", true, true, b"audio"));
        let resolver = resolver_with(vec![offline.clone(), online.clone()], &cache_dir);

        let out = temp.path().join("out.wav");
        assert!(resolver.resolve("你好。", "zh-cn", &out).await.is_some());
        assert_eq!(offline.call_count(), 0);
        assert_eq!(online.call_count(), 1);

        // 缓存里恰好一条，key 为 (文本, 语言) 的哈希
        let key = cache_key("你好。", "zh-cn");
        let entries: Vec<_> = std::fs::read_dir(&cache_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(cache_dir.join(format!("{}.wav", key)).exists());
    }

    #[tokio::test]
    async fn test_second_resolve_is_cache_hit_with_identical_bytes() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let engine = Arc::new(ScriptedEngine::new("e", true, true, b"payload"));
        let resolver = resolver_with(vec![engine.clone()], &cache_dir);

        let out1 = temp.path().join("out1.wav");
        let out2 = temp.path().join("out2.wav");
        resolver.resolve("同一段文本。", "zh-cn", &out1).await.unwrap();
        resolver.resolve("同一段文本。", "zh-cn", &out2).await.unwrap();

        // 第二次命中缓存：引擎只被调用一次，两次产物逐字节一致
        assert_eq!(engine.call_count(), 1);
        assert_eq!(
            std::fs::read(&out1).unwrap(),
            std::fs::read(&out2).unwrap()
        );
    }

    #[tokio::test]
    async fn test_all_engines_fail_returns_none() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let a = Arc::new(ScriptedEngine::new("a", true, false, b""));
        let b = Arc::new(ScriptedEngine::new("b", true, false, b""));
        let resolver = resolver_with(vec![a.clone(), b.clone()], &cache_dir);

        let out = temp.path().join("out.wav");
        assert!(resolver.resolve("失败案例。", "zh-cn", &out).await.is_none());
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        // 失败不污染缓存
        assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_markers_stripped_before_hashing() {
        let temp = tempdir().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();

        let engine = Arc::new(ScriptedEngine::new("e", true, true, b"voice"));
        let resolver = resolver_with(vec![engine.clone()], &cache_dir);

        let out1 = temp.path().join("a.wav");
        let out2 = temp.path().join("b.wav");
        resolver.resolve("你好。{pause}世界。", "zh-cn", &out1).await.unwrap();
        resolver.resolve("你好。世界。", "zh-cn", &out2).await.unwrap();

        // 标记剥离后两段文本等价，共享同一缓存条目
        assert_eq!(engine.call_count(), 1);
    }
}
