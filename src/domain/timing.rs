//! 幻灯片时长策略
//!
//! 每页的展示时长以实际合成音频的测量时长为准，再做上下限收敛。
//! 音频缺失或无法读取时退回固定默认时长，不让单页问题放倒整个流水线。

/// 单页最短展示时长（秒）
pub const MIN_SLIDE_SECS: f64 = 1.0;

/// 单页最长展示时长（秒）
pub const MAX_SLIDE_SECS: f64 = 30.0;

/// 音频不可用时的默认展示时长（秒）
pub const DEFAULT_SLIDE_SECS: f64 = 3.0;

/// 时长收敛策略
#[derive(Debug, Clone)]
pub struct DurationPolicy {
    /// 下限（秒）
    pub min_secs: f64,
    /// 上限（秒）
    pub max_secs: f64,
    /// 测量失败时的默认值（秒）
    pub default_secs: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            min_secs: MIN_SLIDE_SECS,
            max_secs: MAX_SLIDE_SECS,
            default_secs: DEFAULT_SLIDE_SECS,
        }
    }
}

impl DurationPolicy {
    /// 收敛一个测量值：`max(min, min(max, measured))`
    ///
    /// `None` 表示音频缺失或不可读，返回默认时长（默认值同样被收敛）
    pub fn clamp(&self, measured: Option<f64>) -> f64 {
        let seconds = measured.unwrap_or(self.default_secs);
        seconds.clamp(self.min_secs, self.max_secs)
    }
}

/// 单页展示时长
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDuration {
    /// 页码
    pub page: u32,
    /// 展示时长（秒），收敛后满足 min <= seconds <= max
    pub seconds: f64,
}
