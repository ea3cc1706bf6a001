//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod media;
mod speech_cache;
mod speech_engine;

pub use media::{
    EncodeError, MediaProbePort, ProbeError, VideoEncoderPort, VideoMetadata,
};
pub use speech_cache::{cache_key, CacheError, SpeechCachePort};
pub use speech_engine::{SpeechEnginePort, SpeechError, SynthesisRequest};
