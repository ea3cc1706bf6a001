//! Batch Synthesis Scheduler - 批量合成调度
//!
//! 用有界并发跑 Resolver 处理一套课件的全部讲稿单元。
//! 完成顺序无关紧要：产物最终按页码重排，并发只影响吞吐、不影响顺序。
//! 单元失败被丢弃（该页没有配音）；只要有一个单元产出音频，批次即成功。

use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::application::resolver::SpeechResolver;
use crate::domain::deck::{AudioArtifact, ScriptUnit, Slide, SlideAssetPair};

/// 批量合成配置
#[derive(Debug, Clone)]
pub struct BatchSynthesizerConfig {
    /// 最大并发合成数
    pub max_concurrent: usize,
}

impl Default for BatchSynthesizerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// 批量合成调度器
pub struct BatchSynthesizer {
    resolver: Arc<SpeechResolver>,
    config: BatchSynthesizerConfig,
}

impl BatchSynthesizer {
    pub fn new(resolver: Arc<SpeechResolver>, config: BatchSynthesizerConfig) -> Self {
        Self { resolver, config }
    }

    /// 并发合成全部讲稿单元，结果按页码升序返回
    ///
    /// 失败的单元不出现在结果里
    pub async fn synthesize_all(
        &self,
        units: &[ScriptUnit],
        language: &str,
        work_dir: &Path,
    ) -> Vec<AudioArtifact> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(units.len());

        for unit in units {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let resolver = self.resolver.clone();
            let text = unit.raw_text.clone();
            let language = language.to_string();
            let page = unit.page;
            let output = work_dir.join(format!("narration_{:03}.wav", page));

            handles.push(tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到合成完成

                resolver
                    .resolve(&text, &language, &output)
                    .await
                    .map(|path| AudioArtifact { page, path })
            }));
        }

        let mut artifacts: Vec<AudioArtifact> = join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Synthesis task panicked");
                    None
                }
            })
            .collect();

        // 并发完成顺序不定，按页码恢复最终顺序
        artifacts.sort_by_key(|a| a.page);

        let failed = units.len().saturating_sub(artifacts.len());
        if failed > 0 {
            tracing::warn!(
                total = units.len(),
                succeeded = artifacts.len(),
                failed = failed,
                "Some narration units failed, continuing without them"
            );
        } else {
            tracing::info!(total = units.len(), "All narration units synthesized");
        }

        artifacts
    }
}

/// 把音频产物对齐到幻灯片序列，保证 1:1 配对
///
/// 没有自己配音的页复用"最近的前一个"成功产物；
/// 开头的缺口借用第一个成功产物。产物为空时返回空列表。
pub fn align_to_slides(artifacts: &[AudioArtifact], slides: &[Slide]) -> Vec<SlideAssetPair> {
    if artifacts.is_empty() {
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(slides.len());

    for slide in slides {
        // 页码不超过当前页的最后一个产物；没有则取第一个
        let chosen = artifacts
            .iter()
            .take_while(|a| a.page <= slide.page)
            .last()
            .unwrap_or(&artifacts[0]);

        if chosen.page != slide.page {
            tracing::warn!(
                page = slide.page,
                reused_from = chosen.page,
                "Slide has no own narration, reusing nearest artifact"
            );
        }

        pairs.push(SlideAssetPair {
            page: slide.page,
            image: slide.image.clone(),
            audio: chosen.path.clone(),
        });
    }

    pairs
}
