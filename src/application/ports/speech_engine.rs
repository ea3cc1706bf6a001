//! Speech Engine Port - 语音合成引擎抽象
//!
//! 每个引擎只承诺一件事：给定文本和语言，把合成音频写到指定路径。
//! 引擎按固定优先级组成回退链，由 Resolver 依次尝试（见 application::resolver）。

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 语音合成错误
#[derive(Debug, Error)]
pub enum SpeechError {
    /// 引擎在当前主机上不可用（缺少二进制/未配置），回退链跳过即可
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SpeechError {
    fn from(err: std::io::Error) -> Self {
        SpeechError::Io(err.to_string())
    }
}

/// 语音合成请求
///
/// 文本已经过预处理：控制标记已剥离、空白已折叠（见 domain::text）
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: String,
    /// 语言代码（如 zh-cn）
    pub language: String,
}

/// Speech Engine Port
///
/// 合成后端的统一能力接口，网络服务和本地命令行工具都实现它
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    /// 将文本合成为音频并写入 output_path
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError>;

    /// 引擎在当前主机上是否可用
    ///
    /// 不可用只意味着回退链跳过本引擎，不是错误
    async fn is_available(&self) -> bool {
        true
    }

    /// 引擎名（用于日志和追踪）
    fn name(&self) -> &'static str;
}
