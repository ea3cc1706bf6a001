//! Translate TTS Engine - 基础网络引擎
//!
//! 免认证的翻译服务朗读接口，GET 请求返回 MP3。
//! 单次请求有 200 字符的硬上限，超限直接报错交给回退链，
//! 本引擎不做内部切块。

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};

/// 服务端单次请求的字符上限
const MAX_CHARS: usize = 200;

/// Translate TTS 引擎配置
#[derive(Debug, Clone)]
pub struct TranslateTtsEngineConfig {
    /// 朗读接口 URL
    pub endpoint: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for TranslateTtsEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Translate TTS 引擎
pub struct TranslateTtsEngine {
    client: Client,
    config: TranslateTtsEngineConfig,
}

impl TranslateTtsEngine {
    pub fn new(config: TranslateTtsEngineConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SpeechEnginePort for TranslateTtsEngine {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        let text_chars = request.text.chars().count();
        if text_chars > MAX_CHARS {
            return Err(SpeechError::Service(format!(
                "text of {} chars exceeds the {} char single-request limit",
                text_chars, MAX_CHARS
            )));
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", request.language.as_str()),
                ("q", request.text.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else if e.is_connect() {
                    SpeechError::Network(format!("Cannot reach TTS endpoint: {}", e))
                } else {
                    SpeechError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Service(format!("HTTP {}", status)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse("empty audio body".to_string()));
        }

        tokio::fs::write(output_path, &audio).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "translate"
    }
}
