//! 讲解脚本生成
//!
//! 基于规则模板把幻灯片内容改写成口语化讲稿：
//! - 不念"第几页"，直接讲核心内容
//! - 跳过无效页（纯数字标题、开头的目录页）
//! - 在句末标点后插入 `{pause}` 停顿标记（由音频后处理消费，不会被朗读）

use crate::domain::deck::{ScriptUnit, Slide};
use crate::domain::text::collapse_whitespace;

/// 脚本生成配置
#[derive(Debug, Clone)]
pub struct ScriptGeneratorConfig {
    /// 课程名称（标题为空时的开场白兜底）
    pub course_name: String,
}

impl Default for ScriptGeneratorConfig {
    fn default() -> Self {
        Self {
            course_name: "课程".to_string(),
        }
    }
}

/// 规则模板脚本生成器
#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    config: ScriptGeneratorConfig,
}

impl ScriptGenerator {
    pub fn new(config: ScriptGeneratorConfig) -> Self {
        Self { config }
    }

    /// 为整套课件生成讲稿
    ///
    /// 无效页不产出讲稿单元（该页在视频里仍会出现，只是没有解说）
    pub fn generate(&self, slides: &[Slide]) -> Vec<ScriptUnit> {
        let mut units = Vec::with_capacity(slides.len());
        let mut opened = false;

        for (index, slide) in slides.iter().enumerate() {
            let title = clean_text(&slide.title);

            if is_invalid_slide(&title, index) {
                tracing::debug!(page = slide.page, "Skipping invalid slide");
                continue;
            }

            let mut parts: Vec<String> = Vec::new();

            // 开场白只加在第一个有效页
            if !opened {
                if title.is_empty() {
                    parts.push(format!("今天我们来学习{}。", self.config.course_name));
                } else {
                    parts.push(format!("今天我们来学习：{}。", title));
                }
                opened = true;
            } else if !title.is_empty() {
                parts.push(format!("我们来看：{}。", title));
            }

            for item in &slide.body {
                let item = clean_text(item);
                if item.chars().count() > 1 {
                    parts.push(item);
                }
            }

            if parts.is_empty() {
                tracing::debug!(page = slide.page, "Slide has no narratable content");
                continue;
            }

            let script = add_pauses(&parts.join(" "));

            units.push(ScriptUnit {
                page: slide.page,
                title,
                raw_text: script,
            });
        }

        units
    }
}

/// 清理标题/正文里的无用内容
///
/// 去掉文件后缀、章节编号页眉、纯数字（通常是页码），并折叠空白
pub fn clean_text(text: &str) -> String {
    let mut text = collapse_whitespace(text);

    for suffix in [".pptx", ".ppt", ".PPTX", ".PPT"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.trim_end().to_string();
            break;
        }
    }

    if is_digits(&text) || is_section_header(&text) || is_chapter_number(&text) {
        return String::new();
    }

    text
}

/// 纯数字（含空串判定为 false）
fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// "第N章" 形式的章节编号
fn is_chapter_number(text: &str) -> bool {
    let Some(inner) = text.strip_prefix('第').and_then(|t| t.strip_suffix('章')) else {
        return false;
    };
    !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit())
}

/// "PART 1" / "SECTION 2" / "CHAPTER 3" 形式的分节页眉
fn is_section_header(text: &str) -> bool {
    let upper = text.to_uppercase();
    for prefix in ["PART", "SECTION", "CHAPTER"] {
        if let Some(rest) = upper.strip_prefix(prefix) {
            if rest.trim().chars().all(|c| c.is_ascii_digit() || c == '.') {
                return true;
            }
        }
    }
    false
}

/// 是否为无效页（不生成讲稿）
///
/// 纯数字标题视为页码页；前两页里出现"目录"之类的标题视为目录页
fn is_invalid_slide(title: &str, index: usize) -> bool {
    if is_digits(title) {
        return true;
    }

    if index < 2 {
        let lower = title.to_lowercase();
        for keyword in ["目录", "contents", "agenda", "章"] {
            if lower.contains(keyword) {
                return true;
            }
        }
    }

    false
}

/// 在句末标点和逗号后插入 {pause} 停顿标记，连续标记只保留一个
fn add_pauses(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    let mut pending_pause = false;

    for ch in text.chars() {
        if pending_pause && !ch.is_whitespace() {
            result.push_str("{pause}");
            pending_pause = false;
        }
        result.push(ch);
        if matches!(ch, '。' | '！' | '？' | '，') {
            pending_pause = true;
        }
    }

    collapse_whitespace(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn slide(page: u32, title: &str, body: &[&str]) -> Slide {
        Slide {
            page,
            title: title.to_string(),
            body: body.iter().map(|s| s.to_string()).collect(),
            image: PathBuf::from(format!("slide_{:03}.png", page)),
        }
    }

    #[test]
    fn test_clean_text_strips_ppt_suffix() {
        assert_eq!(clean_text("数据结构.pptx"), "数据结构");
        assert_eq!(clean_text("数据结构.PPT"), "数据结构");
    }

    #[test]
    fn test_clean_text_drops_noise() {
        assert_eq!(clean_text("42"), "");
        assert_eq!(clean_text("第3章"), "");
        assert_eq!(clean_text("PART 2"), "");
        assert_eq!(clean_text("SECTION 1.2"), "");
    }

    #[test]
    fn test_clean_text_keeps_real_titles() {
        assert_eq!(clean_text("第3章的收获"), "第3章的收获");
        assert_eq!(clean_text("  二叉树   的遍历 "), "二叉树 的遍历");
    }

    #[test]
    fn test_opening_line_on_first_valid_slide() {
        let generator = ScriptGenerator::default();
        let slides = vec![slide(1, "二叉树", &["二叉树是一种树形结构"])];
        let units = generator.generate(&slides);

        assert_eq!(units.len(), 1);
        assert!(units[0].raw_text.starts_with("今天我们来学习：二叉树。"));
    }

    #[test]
    fn test_toc_slide_skipped_but_later_chapter_kept() {
        let generator = ScriptGenerator::default();
        let slides = vec![
            slide(1, "目录", &["一、概念", "二、实现"]),
            slide(2, "二叉树的概念", &["每个结点至多两个子树"]),
        ];
        let units = generator.generate(&slides);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].page, 2);
        // 目录页被跳过后，开场白落在第一个有效页
        assert!(units[0].raw_text.starts_with("今天我们来学习"));
    }

    #[test]
    fn test_digit_title_slide_skipped() {
        let generator = ScriptGenerator::default();
        let slides = vec![
            slide(1, "排序算法", &["排序是基础操作"]),
            slide(2, "17", &[]),
        ];
        let units = generator.generate(&slides);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].page, 1);
    }

    #[test]
    fn test_pause_markers_inserted() {
        let script = add_pauses("第一句。第二句，第三句！");
        assert_eq!(script, "第一句。{pause}第二句，{pause}第三句！");
    }

    #[test]
    fn test_pause_markers_not_duplicated() {
        let script = add_pauses("结束了。 下一段");
        assert_eq!(script, "结束了。 {pause}下一段");
        assert_eq!(script.matches("{pause}").count(), 1);
    }

    #[test]
    fn test_pages_preserved_from_slides() {
        let generator = ScriptGenerator::default();
        let slides = vec![
            slide(3, "堆", &["堆是完全二叉树"]),
            slide(5, "堆排序", &["自底向上建堆"]),
        ];
        let units = generator.generate(&slides);
        let pages: Vec<u32> = units.iter().map(|u| u.page).collect();
        assert_eq!(pages, vec![3, 5]);
    }
}
