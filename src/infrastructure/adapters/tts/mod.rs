//! TTS Adapters - 语音合成引擎实现
//!
//! 回退链固定优先级：
//! 1. espeak: 快速本地离线引擎（主机装有 espeak-ng 时）
//! 2. http: 更高质量的网络合成服务
//! 3. translate: 基础网络引擎（免认证，单次请求长度受限）
//! 4. say: 平台自带命令行工具，最后兜底

mod espeak;
mod fake;
mod http_tts;
mod say;
mod translate_tts;
pub(crate) mod wav;

pub use espeak::{EspeakEngine, EspeakEngineConfig};
pub use fake::{FakeSpeechEngine, FakeSpeechEngineConfig};
pub use http_tts::{HttpTtsEngine, HttpTtsEngineConfig};
pub use say::{SayEngine, SayEngineConfig};
pub use translate_tts::{TranslateTtsEngine, TranslateTtsEngineConfig};

use std::process::Stdio;
use std::sync::Arc;

use crate::application::ports::{SpeechEnginePort, SpeechError};
use crate::config::TtsConfig;

/// 按固定优先级构建引擎回退链
pub fn build_engine_chain(config: &TtsConfig) -> Result<Vec<Arc<dyn SpeechEnginePort>>, SpeechError> {
    let http_config = HttpTtsEngineConfig {
        base_url: config.http_url.clone(),
        timeout_secs: config.timeout_secs,
        max_chars: config.max_chars_per_request,
    };

    Ok(vec![
        Arc::new(EspeakEngine::new(EspeakEngineConfig::default())),
        Arc::new(HttpTtsEngine::new(http_config)?),
        Arc::new(TranslateTtsEngine::new(TranslateTtsEngineConfig {
            timeout_secs: config.timeout_secs,
            ..Default::default()
        })?),
        Arc::new(SayEngine::new(SayEngineConfig::default())),
    ])
}

/// 检查命令行工具是否存在（能被启动即视为存在，不看退出码）
pub(crate) async fn binary_available(binary: &str) -> bool {
    tokio::process::Command::new(binary)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok()
}

/// 截取 stderr 末尾（错误信息通常在最后几行）
pub(crate) fn stderr_tail(stderr: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let start = text.len() - max_bytes;
    // 避开多字节字符的中间
    let start = (start..text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len());
    text[start..].to_string()
}

/// 语言代码的主子标签（zh-cn → zh）
pub(crate) fn primary_language_subtag(language: &str) -> &str {
    language.split(['-', '_']).next().unwrap_or(language)
}
