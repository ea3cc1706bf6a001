//! Say Engine - 平台自带命令行合成，最后兜底
//!
//! macOS: `say`；Linux: festival 的 `text2wave`；Windows: PowerShell System.Speech。
//! 任何平台上对应工具缺失都只是"跳过"，不是错误。

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};
use crate::infrastructure::adapters::tts::{binary_available, stderr_tail};

/// Say 引擎配置
#[derive(Debug, Clone, Default)]
pub struct SayEngineConfig {
    /// 指定音色（空则用系统默认）
    pub voice: Option<String>,
}

/// 平台命令行合成引擎
pub struct SayEngine {
    config: SayEngineConfig,
}

impl SayEngine {
    pub fn new(config: SayEngineConfig) -> Self {
        Self { config }
    }

    fn map_spawn_error(binary: &str, err: std::io::Error) -> SpeechError {
        if err.kind() == std::io::ErrorKind::NotFound {
            SpeechError::Unavailable(format!("{} not installed", binary))
        } else {
            SpeechError::Io(err.to_string())
        }
    }

    #[cfg(target_os = "macos")]
    async fn synthesize_platform(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        let mut cmd = tokio::process::Command::new("say");
        if let Some(voice) = &self.config.voice {
            cmd.arg("-v").arg(voice);
        }
        let output = cmd
            .arg("-o")
            .arg(output_path)
            .arg("--file-format=WAVE")
            .arg("--data-format=LEI16@22050")
            .arg(&request.text)
            .output()
            .await
            .map_err(|e| Self::map_spawn_error("say", e))?;

        if !output.status.success() {
            return Err(SpeechError::Service(format!(
                "say exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 400)
            )));
        }
        Ok(())
    }

    #[cfg(target_os = "linux")]
    async fn synthesize_platform(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        // text2wave 从标准输入读文本
        let mut child = tokio::process::Command::new("text2wave")
            .arg("-o")
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::map_spawn_error("text2wave", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.text.as_bytes())
                .await
                .map_err(|e| SpeechError::Io(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SpeechError::Io(e.to_string()))?;

        if !output.status.success() {
            return Err(SpeechError::Service(format!(
                "text2wave exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 400)
            )));
        }
        Ok(())
    }

    #[cfg(target_os = "windows")]
    async fn synthesize_platform(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        // PowerShell 单引号字符串里的单引号用两个单引号转义
        let text = request.text.replace('\'', "''");
        let out = output_path.display().to_string().replace('\'', "''");
        let script = format!(
            "Add-Type -AssemblyName System.Speech; \
             $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $s.SetOutputToWaveFile('{}'); $s.Speak('{}'); $s.Dispose()",
            out, text
        );

        let output = tokio::process::Command::new("powershell")
            .arg("-NoProfile")
            .arg("-Command")
            .arg(&script)
            .output()
            .await
            .map_err(|e| Self::map_spawn_error("powershell", e))?;

        if !output.status.success() {
            return Err(SpeechError::Service(format!(
                "powershell exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 400)
            )));
        }
        Ok(())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    async fn synthesize_platform(
        &self,
        _request: &SynthesisRequest,
        _output_path: &Path,
    ) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(
            "no platform TTS on this OS".to_string(),
        ))
    }
}

#[async_trait]
impl SpeechEnginePort for SayEngine {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        output_path: &Path,
    ) -> Result<(), SpeechError> {
        self.synthesize_platform(request, output_path).await
    }

    async fn is_available(&self) -> bool {
        #[cfg(target_os = "macos")]
        return binary_available("say").await;

        #[cfg(target_os = "linux")]
        return binary_available("text2wave").await;

        #[cfg(target_os = "windows")]
        return binary_available("powershell").await;

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return false;
    }

    fn name(&self) -> &'static str {
        "say"
    }
}
