//! WAV 读写工具
//!
//! 只做分块合成需要的最小集：解析 RIFF 头取出 PCM 数据、
//! 生成定长静音、把同格式的块拼回一个完整 WAV。

use thiserror::Error;

/// WAV 处理错误
#[derive(Debug, Error)]
pub enum WavError {
    #[error("Invalid WAV: {0}")]
    Invalid(String),

    #[error("Chunk format mismatch: {0}")]
    FormatMismatch(String),
}

/// PCM 格式参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 每秒字节数
    fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample / 8) as u32
    }

    /// 一帧（全部声道一个采样）的字节数
    fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }
}

/// 解析出的 WAV：格式 + PCM 数据
#[derive(Debug)]
pub struct ParsedWav {
    pub format: WavFormat,
    pub pcm: Vec<u8>,
}

/// 解析 WAV 文件内容
pub fn parse_wav(data: &[u8]) -> Result<ParsedWav, WavError> {
    if data.len() < 44 {
        return Err(WavError::Invalid("data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(WavError::Invalid("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(WavError::Invalid("missing WAVE identifier".to_string()));
    }

    let mut pos = 12;
    let mut format: Option<WavFormat> = None;
    let mut pcm: Option<Vec<u8>> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size =
            u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;
        let body_start = pos + 8;
        let body_end = (body_start + chunk_size).min(data.len());

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body_start + 16 > data.len() {
                    return Err(WavError::Invalid("fmt chunk too short".to_string()));
                }
                let fmt = &data[body_start..body_start + 16];
                format = Some(WavFormat {
                    channels: u16::from_le_bytes([fmt[2], fmt[3]]),
                    sample_rate: u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]),
                    bits_per_sample: u16::from_le_bytes([fmt[14], fmt[15]]),
                });
            }
            b"data" => {
                pcm = Some(data[body_start..body_end].to_vec());
                break;
            }
            _ => {}
        }

        pos = body_start + chunk_size;
        // chunk 按偶数字节对齐
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    let format = format.ok_or_else(|| WavError::Invalid("missing fmt chunk".to_string()))?;
    let pcm = pcm.ok_or_else(|| WavError::Invalid("missing data chunk".to_string()))?;

    if format.channels == 0 || format.sample_rate == 0 || format.bits_per_sample == 0 {
        return Err(WavError::Invalid("degenerate fmt chunk".to_string()));
    }

    Ok(ParsedWav { format, pcm })
}

/// 给定格式生成指定毫秒数的静音 PCM
pub fn silence_pcm(format: &WavFormat, millis: u64) -> Vec<u8> {
    let bytes = (format.byte_rate() as u64 * millis / 1000) as usize;
    let block = format.block_align() as usize;
    let aligned = if block > 0 { bytes - bytes % block } else { bytes };
    vec![0u8; aligned]
}

/// 把 PCM 数据封装为完整 WAV 文件内容
pub fn write_wav(format: &WavFormat, pcm: &[u8]) -> Vec<u8> {
    let data_size = pcm.len();
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&format.block_align().to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

/// 把若干同格式 WAV 块拼为一个，块间插入 gap_millis 毫秒静音
///
/// 块边界不加静音会有明显的"撞击感"，约 200ms 的间隔听感自然
pub fn concat_with_silence(chunks: &[Vec<u8>], gap_millis: u64) -> Result<Vec<u8>, WavError> {
    let first = chunks
        .first()
        .ok_or_else(|| WavError::Invalid("no chunks to concatenate".to_string()))?;
    let parsed = parse_wav(first)?;
    let format = parsed.format.clone();
    let gap = silence_pcm(&format, gap_millis);

    let mut pcm = parsed.pcm;
    for chunk in &chunks[1..] {
        let parsed = parse_wav(chunk)?;
        if parsed.format != format {
            return Err(WavError::FormatMismatch(format!(
                "expected {:?}, got {:?}",
                format, parsed.format
            )));
        }
        pcm.extend_from_slice(&gap);
        pcm.extend_from_slice(&parsed.pcm);
    }

    Ok(write_wav(&format, &pcm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_format() -> WavFormat {
        WavFormat {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
        }
    }

    /// 1 秒 16kHz 单声道静音 WAV
    fn one_second_wav() -> Vec<u8> {
        let format = test_format();
        let pcm = vec![0u8; format.byte_rate() as usize];
        write_wav(&format, &pcm)
    }

    #[test]
    fn test_roundtrip() {
        let wav = one_second_wav();
        let parsed = parse_wav(&wav).unwrap();
        assert_eq!(parsed.format, test_format());
        assert_eq!(parsed.pcm.len(), 32000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wav(b"not a wav").is_err());
        assert!(parse_wav(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_silence_length_aligned() {
        let format = test_format();
        let silence = silence_pcm(&format, 200);
        // 200ms @ 16kHz 16bit mono = 6400 字节，且对齐到 block
        assert_eq!(silence.len(), 6400);
        assert_eq!(silence.len() % format.block_align() as usize, 0);
    }

    #[test]
    fn test_concat_inserts_gap() {
        let a = one_second_wav();
        let b = one_second_wav();
        let joined = concat_with_silence(&[a, b], 200).unwrap();
        let parsed = parse_wav(&joined).unwrap();
        // 两秒音频 + 200ms 静音
        assert_eq!(parsed.pcm.len(), 32000 + 6400 + 32000);
    }

    #[test]
    fn test_concat_rejects_format_mismatch() {
        let a = one_second_wav();
        let other = write_wav(
            &WavFormat {
                channels: 2,
                sample_rate: 16000,
                bits_per_sample: 16,
            },
            &[0u8; 64],
        );
        assert!(matches!(
            concat_with_silence(&[a, other], 200),
            Err(WavError::FormatMismatch(_))
        ));
    }

    #[test]
    fn test_concat_single_chunk_passthrough() {
        let a = one_second_wav();
        let joined = concat_with_silence(&[a.clone()], 200).unwrap();
        assert_eq!(parse_wav(&joined).unwrap().pcm, parse_wav(&a).unwrap().pcm);
    }
}
