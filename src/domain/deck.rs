//! Deck Context - 课件值对象
//!
//! 一套课件 = 有序的幻灯片序列（页码、标题、正文、页面图片）。
//! 文本如何从源文件中提取不属于本系统（清单由外部生产者提供）。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 单页幻灯片
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 页码（从 1 开始）
    pub page: u32,
    /// 标题
    #[serde(default)]
    pub title: String,
    /// 正文内容列表
    #[serde(default)]
    pub body: Vec<String>,
    /// 页面图片路径
    pub image: PathBuf,
}

/// 一套课件
#[derive(Debug, Clone)]
pub struct Deck {
    /// 课件标题
    pub title: String,
    /// 讲解语言（如 zh-cn）
    pub language: String,
    /// 幻灯片序列（按页码升序）
    pub slides: Vec<Slide>,
}

impl Deck {
    /// 页数
    pub fn page_count(&self) -> usize {
        self.slides.len()
    }
}

/// 单页讲解脚本
///
/// 由脚本生成器产出，交给合成流水线后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptUnit {
    /// 页码
    pub page: u32,
    /// 标题
    pub title: String,
    /// 讲解文本（可含 {pause} 等控制标记）
    pub raw_text: String,
}

/// 合成完成的音频产物
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// 页码
    pub page: u32,
    /// 音频文件路径
    pub path: PathBuf,
}

/// 对齐后的幻灯片素材对
///
/// 不变式：对齐之后每页恰好对应一个音频
#[derive(Debug, Clone)]
pub struct SlideAssetPair {
    /// 页码
    pub page: u32,
    /// 页面图片
    pub image: PathBuf,
    /// 该页讲解音频
    pub audio: PathBuf,
}

/// 单页音视频片段
///
/// 由片段编码产出，拼接完成后即删除
#[derive(Debug, Clone)]
pub struct VideoSegment {
    /// 页码
    pub page: u32,
    /// 片段文件路径
    pub path: PathBuf,
    /// 片段时长（秒）
    pub seconds: f64,
}

/// 最终视频产物
#[derive(Debug, Clone)]
pub struct FinalVideo {
    /// 输出文件路径
    pub path: PathBuf,
    /// 视频标题
    pub title: String,
    /// 总时长（秒）
    pub duration_secs: f64,
}
