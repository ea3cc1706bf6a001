//! HTTP TTS Engine - 调用外部 TTS HTTP 服务
//!
//! POST {base_url}/api/tts/synthesize
//! Request: {"text": "...", "language": "zh-cn"}  (JSON)
//! Response: audio/wav binary
//!
//! 服务端对单次请求有文本长度上限。超限文本在这里按句切块、
//! 逐块合成、块间插入约 200ms 静音后拼接——对 Resolver 完全透明。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};
use crate::domain::text::chunk_sentences;
use crate::infrastructure::adapters::tts::wav;

/// 块间静音时长（毫秒）
const CHUNK_GAP_MILLIS: u64 = 200;

/// TTS 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    /// 要合成的文本
    text: &'a str,
    /// 语言代码
    language: &'a str,
}

/// HTTP TTS 引擎配置
#[derive(Debug, Clone)]
pub struct HttpTtsEngineConfig {
    /// TTS 服务基础 URL；未配置时引擎不可用
    pub base_url: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 单次请求的文本长度上限（字符数）
    pub max_chars: usize,
}

impl Default for HttpTtsEngineConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 120,
            max_chars: 500,
        }
    }
}

/// HTTP TTS 引擎
pub struct HttpTtsEngine {
    client: Client,
    config: HttpTtsEngineConfig,
}

impl HttpTtsEngine {
    pub fn new(config: HttpTtsEngineConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self, base_url: &str) -> String {
        format!("{}/api/tts/synthesize", base_url)
    }

    /// 切块的目标长度：上限再留两成安全余量
    fn chunk_target(&self) -> usize {
        (self.config.max_chars - self.config.max_chars / 5).max(1)
    }

    /// 合成单个文本块，返回音频字节
    async fn synthesize_chunk(
        &self,
        base_url: &str,
        text: &str,
        language: &str,
    ) -> Result<Vec<u8>, SpeechError> {
        let request = TtsHttpRequest { text, language };

        tracing::debug!(
            url = %self.synthesize_url(base_url),
            text_chars = text.chars().count(),
            "Sending TTS request"
        );

        let response = self
            .client
            .post(self.synthesize_url(base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else if e.is_connect() {
                    SpeechError::Network(format!("Cannot connect to TTS service: {}", e))
                } else {
                    SpeechError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Service(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse("empty audio body".to_string()));
        }

        Ok(audio)
    }
}

#[async_trait]
impl SpeechEnginePort for HttpTtsEngine {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .ok_or_else(|| SpeechError::Unavailable("no TTS service configured".to_string()))?;

        let text_chars = request.text.chars().count();

        let audio = if text_chars <= self.config.max_chars {
            self.synthesize_chunk(base_url, &request.text, &request.language)
                .await?
        } else {
            // 超限：按句切块逐个合成，块间插入静音避免生硬的拼接边界
            let chunks = chunk_sentences(&request.text, self.chunk_target());
            tracing::info!(
                text_chars = text_chars,
                chunks = chunks.len(),
                "Text exceeds request limit, splitting at sentence boundaries"
            );

            let mut chunk_audio = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                chunk_audio.push(
                    self.synthesize_chunk(base_url, chunk, &request.language)
                        .await?,
                );
            }

            wav::concat_with_silence(&chunk_audio, CHUNK_GAP_MILLIS)
                .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?
        };

        tokio::fs::write(output_path, &audio).await?;
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.config.base_url.is_some()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
