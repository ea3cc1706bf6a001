//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod cache;
pub mod media;
pub mod tts;

pub use cache::*;
pub use media::*;
pub use tts::*;
