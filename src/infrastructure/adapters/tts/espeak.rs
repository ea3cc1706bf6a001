//! Espeak Engine - 本地离线合成
//!
//! 调用 espeak-ng 命令行直接写出 WAV。速度快、不依赖网络，
//! 音质一般，作为回退链的第一优先级。

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};
use crate::infrastructure::adapters::tts::{
    binary_available, primary_language_subtag, stderr_tail,
};

/// Espeak 引擎配置
#[derive(Debug, Clone)]
pub struct EspeakEngineConfig {
    /// 可执行文件名
    pub binary: String,
    /// 语速（每分钟词数）
    pub speed_wpm: u32,
}

impl Default for EspeakEngineConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".to_string(),
            speed_wpm: 150,
        }
    }
}

/// Espeak 引擎
pub struct EspeakEngine {
    config: EspeakEngineConfig,
}

impl EspeakEngine {
    pub fn new(config: EspeakEngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SpeechEnginePort for EspeakEngine {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        let voice = primary_language_subtag(&request.language);

        let output = tokio::process::Command::new(&self.config.binary)
            .arg("-v")
            .arg(voice)
            .arg("-s")
            .arg(self.config.speed_wpm.to_string())
            .arg("-w")
            .arg(output_path)
            .arg(&request.text)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SpeechError::Unavailable(format!("{} not installed", self.config.binary))
                } else {
                    SpeechError::Io(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(SpeechError::Service(format!(
                "{} exited with {}: {}",
                self.config.binary,
                output.status,
                stderr_tail(&output.stderr, 400)
            )));
        }

        Ok(())
    }

    async fn is_available(&self) -> bool {
        binary_available(&self.config.binary).await
    }

    fn name(&self) -> &'static str {
        "espeak"
    }
}
