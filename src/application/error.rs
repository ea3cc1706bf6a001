//! 应用层错误定义
//!
//! 单元级失败（某一页的配音）被吸收降级为尽力而为的继续；
//! 运行级失败（片段编码、装配）中止并向调用方给出明确原因。

use thiserror::Error;

use crate::application::ports::EncodeError;

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 课件里没有任何幻灯片
    #[error("Deck contains no slides")]
    EmptyDeck,

    /// 所有讲稿单元都合成失败
    #[error("No narration could be synthesized for any slide")]
    NoNarration,

    /// 单个片段编码失败（致命：缺页会破坏"每页一段"的装配不变式）
    #[error("Segment encoding failed: {0}")]
    SegmentEncode(String),

    /// 视频装配失败（拼接/元数据/产物缺失）
    #[error("Video assembly failed: {0}")]
    Assembly(String),

    /// 外部中断信号，已在阶段边界停止
    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<EncodeError> for PipelineError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::SegmentFailed(msg) => PipelineError::SegmentEncode(msg),
            other => PipelineError::Assembly(other.to_string()),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}
