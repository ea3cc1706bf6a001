//! 语音文本预处理
//!
//! 讲解脚本里可以携带行内控制标记（如 `{pause}`、`{pause:500}`、`{speed:0.9}`），
//! 这些标记是给音频后处理用的指令，绝不能被朗读出来。
//! 送入任何合成引擎（以及计算缓存 key）之前必须先剥离标记并折叠空白。

/// 句末标点（分句边界）
#[inline]
fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!')
}

/// 是否为受支持的控制标记名
fn is_control_marker(name: &str) -> bool {
    let name = name.trim();
    name == "pause"
        || name.starts_with("pause:")
        || name.starts_with("speed:")
        || name.starts_with("rate:")
}

/// 剥离行内控制标记
///
/// 只移除 `{...}` 中已知的标记；其他花括号内容原样保留
pub fn strip_control_markers(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        let (head, tail) = rest.split_at(start);
        result.push_str(head);

        match tail[1..].find('}') {
            Some(end) => {
                let inner = &tail[1..1 + end];
                if is_control_marker(inner) {
                    // 丢弃整个标记
                } else {
                    result.push_str(&tail[..end + 2]);
                }
                rest = &tail[end + 2..];
            }
            None => {
                // 未闭合的花括号，保留剩余内容
                result.push_str(tail);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}

/// 折叠空白：任意连续空白压缩为单个空格，去除首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 合成前的完整预处理：剥离标记 + 折叠空白
///
/// 结果为空字符串表示"没有可朗读的内容"
pub fn normalize_for_speech(text: &str) -> String {
    collapse_whitespace(&strip_control_markers(text))
}

/// 按句末标点分句（标点保留在句尾）
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if is_sentence_terminal(ch) {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }

    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences
}

/// 将文本切分为不超过 `max_chars` 个字符的块，切分点只落在句末标点
///
/// 超长的单句不会被腰斩，而是单独成块（由调用方决定如何处理）。
/// 字符数按 Unicode 字符计（CJK 一字一计）。
pub fn chunk_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in sentences {
        let sentence_chars = sentence.chars().count();

        if current_chars > 0 && current_chars + sentence_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current.push_str(&sentence);
        current_chars += sentence_chars;

        // 单句已超限：立即独立成块
        if current_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_pause_markers() {
        let text = "大家好。{pause}今天我们来学习。{pause:500}开始吧";
        assert_eq!(
            strip_control_markers(text),
            "大家好。今天我们来学习。开始吧"
        );
    }

    #[test]
    fn test_strip_speed_markers() {
        let text = "{speed:0.9}这一段要讲慢一点{rate:120}";
        assert_eq!(strip_control_markers(text), "这一段要讲慢一点");
    }

    #[test]
    fn test_unknown_braces_preserved() {
        let text = "集合{1, 2, 3}是有限集";
        assert_eq!(strip_control_markers(text), "集合{1, 2, 3}是有限集");
    }

    #[test]
    fn test_unclosed_brace_preserved() {
        let text = "左花括号{不闭合";
        assert_eq!(strip_control_markers(text), "左花括号{不闭合");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_normalize_marker_only_text_is_empty() {
        assert_eq!(normalize_for_speech("{pause} {pause:300} "), "");
    }

    #[test]
    fn test_split_sentences_cjk() {
        let sentences = split_sentences("第一句。第二句！第三句？尾巴");
        assert_eq!(sentences, vec!["第一句。", "第二句！", "第三句？", "尾巴"]);
    }

    #[test]
    fn test_chunk_respects_sentence_boundaries() {
        let text = "一二三四五。六七八九十。十一十二十三。";
        let chunks = chunk_sentences(text, 12);
        // 每块都以句末标点结尾，没有句子被腰斩
        assert_eq!(chunks, vec!["一二三四五。六七八九十。", "十一十二十三。"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
        }
    }

    #[test]
    fn test_chunk_oversized_single_sentence() {
        let text = "这是一个完全没有标点因此无法在句边界切开的超长句子";
        let chunks = chunk_sentences(text, 10);
        // 超长单句不被腰斩，单独成块
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_chunk_short_text_single_chunk() {
        let chunks = chunk_sentences("你好。", 100);
        assert_eq!(chunks, vec!["你好。"]);
    }
}
