//! Deck Manifest - JSON 课件清单
//!
//! 幻灯片文本的提取方式不属于本系统：外部生产者（文档解析工具等）
//! 产出一个 JSON 清单，描述每页的文本与页面图片。格式：
//!
//! ```json
//! {
//!   "title": "数据结构第三讲",
//!   "language": "zh-cn",
//!   "slides": [
//!     {"page": 1, "title": "二叉树", "body": ["..."], "image": "slides/001.png"}
//!   ]
//! }
//! ```
//!
//! 图片路径相对于清单文件所在目录解析。

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::deck::{Deck, Slide};

/// 清单加载错误
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Failed to read deck manifest: {0}")]
    Read(String),

    #[error("Failed to parse deck manifest: {0}")]
    Parse(String),

    #[error("Invalid deck manifest: {0}")]
    Validation(String),
}

fn default_language() -> String {
    "zh-cn".to_string()
}

/// 清单文件结构
#[derive(Debug, Deserialize)]
struct DeckManifest {
    /// 课件标题
    title: String,
    /// 讲解语言
    #[serde(default = "default_language")]
    language: String,
    /// 幻灯片列表
    slides: Vec<Slide>,
}

/// 加载并校验课件清单
pub async fn load_deck(manifest_path: &Path) -> Result<Deck, DeckError> {
    let content = tokio::fs::read_to_string(manifest_path)
        .await
        .map_err(|e| DeckError::Read(format!("{}: {}", manifest_path.display(), e)))?;

    let manifest: DeckManifest =
        serde_json::from_str(&content).map_err(|e| DeckError::Parse(e.to_string()))?;

    if manifest.slides.is_empty() {
        return Err(DeckError::Validation("deck has no slides".to_string()));
    }

    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let mut slides = Vec::with_capacity(manifest.slides.len());
    let mut seen_pages = std::collections::HashSet::new();

    for mut slide in manifest.slides {
        if slide.page == 0 {
            return Err(DeckError::Validation(
                "slide pages are numbered from 1".to_string(),
            ));
        }
        if !seen_pages.insert(slide.page) {
            return Err(DeckError::Validation(format!(
                "duplicate page {}",
                slide.page
            )));
        }

        // 相对路径基于清单所在目录
        if slide.image.is_relative() {
            slide.image = base_dir.join(&slide.image);
        }
        if !slide.image.exists() {
            return Err(DeckError::Validation(format!(
                "slide {} image not found: {}",
                slide.page,
                slide.image.display()
            )));
        }

        slides.push(slide);
    }

    slides.sort_by_key(|s| s.page);

    tracing::info!(
        title = %manifest.title,
        language = %manifest.language,
        slides = slides.len(),
        "Deck manifest loaded"
    );

    Ok(Deck {
        title: manifest.title,
        language: manifest.language,
        slides,
    })
}
