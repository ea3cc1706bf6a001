//! Slidecast - 自动化教学课程录制系统
//!
//! 把课件（每页文本 + 页面图片）转换为带解说配音的教学视频。
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Deck Context: 课件、讲稿、素材配对等值对象
//! - Script: 规则模板讲稿生成
//! - Text / Timing: 语音文本预处理与时长策略
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechEngine, SpeechCache, MediaProbe, VideoEncoder）
//! - Resolver: 单段文本合成解析（缓存 → 引擎回退链 → 回填）
//! - Scheduler: 有界并发批量合成与页码对齐
//! - Composer / Pipeline: 时长计算、片段编码、装配与整条流水线编排
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: TTS 引擎（espeak / HTTP / translate / say）、文件缓存、ffmpeg/ffprobe
//! - Deck: JSON 课件清单加载

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
