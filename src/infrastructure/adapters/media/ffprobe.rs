//! Ffprobe Media Probe - 读取媒体真实时长
//!
//! `ffprobe -v error -show_entries format=duration -of csv=p=0 <file>`

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{MediaProbePort, ProbeError};

/// ffprobe 配置
#[derive(Debug, Clone)]
pub struct FfprobeMediaProbeConfig {
    /// 可执行文件名
    pub binary: String,
}

impl Default for FfprobeMediaProbeConfig {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

/// ffprobe 适配器
pub struct FfprobeMediaProbe {
    config: FfprobeMediaProbeConfig,
}

impl FfprobeMediaProbe {
    pub fn new(config: FfprobeMediaProbeConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FfprobeMediaProbeConfig::default())
    }
}

/// 解析 ffprobe 的 csv 输出为秒数
fn parse_duration_output(stdout: &str) -> Result<f64, ProbeError> {
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|e| ProbeError::Parse(format!("'{}': {}", stdout.trim(), e)))
}

#[async_trait]
impl MediaProbePort for FfprobeMediaProbe {
    async fn media_duration_secs(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = tokio::process::Command::new(&self.config.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| ProbeError::Spawn(format!("{}: {}", self.config.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(stderr.trim().to_string()));
        }

        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert_eq!(parse_duration_output("12.345\n").unwrap(), 12.345);
        assert_eq!(parse_duration_output("3").unwrap(), 3.0);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration_output("N/A").is_err());
        assert!(parse_duration_output("").is_err());
    }
}
