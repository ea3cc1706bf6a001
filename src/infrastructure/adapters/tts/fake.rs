//! Fake Speech Engine - 用于测试的合成引擎
//!
//! 不调用任何外部服务，按配置生成定长静音 WAV（或按脚本失败），
//! 并记录被调用的次数。

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};
use crate::infrastructure::adapters::tts::wav::{silence_pcm, write_wav, WavFormat};

/// Fake Speech Engine 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechEngineConfig {
    /// 产出音频的时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 是否可用
    pub available: bool,
    /// 合成是否失败
    pub fail: bool,
}

impl Default for FakeSpeechEngineConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            sample_rate: 16000,
            available: true,
            fail: false,
        }
    }
}

/// Fake Speech Engine
pub struct FakeSpeechEngine {
    config: FakeSpeechEngineConfig,
    calls: AtomicUsize,
}

impl FakeSpeechEngine {
    pub fn new(config: FakeSpeechEngineConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechEngineConfig::default())
    }

    /// 被调用（synthesize）的次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEnginePort for FakeSpeechEngine {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.config.fail {
            return Err(SpeechError::Service("scripted failure".to_string()));
        }

        tracing::debug!(
            text_chars = request.text.chars().count(),
            duration_ms = self.config.duration_ms,
            "FakeSpeechEngine: writing silent audio"
        );

        let format = WavFormat {
            channels: 1,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
        };
        let pcm = silence_pcm(&format, self.config.duration_ms);
        tokio::fs::write(output_path, write_wav(&format, &pcm)).await?;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.config.available
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
