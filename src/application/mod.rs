//! 应用层
//!
//! - ports: 出站端口（合成引擎、缓存、媒体探测、视频编码）
//! - resolver: 单段文本的合成解析（缓存 → 引擎回退链 → 回填缓存）
//! - scheduler: 整套课件的有界并发批量合成与对齐
//! - composer: 时长计算、片段编码与最终装配
//! - pipeline: 整条流水线编排（脚本 → 合成 → 装配）与取消检查

pub mod composer;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod resolver;
pub mod scheduler;

pub use error::PipelineError;
