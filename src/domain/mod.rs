//! 领域层
//!
//! 纯业务逻辑，不依赖任何基础设施：
//! - deck: 课件与讲稿的值对象
//! - script: 讲解脚本生成（模板规则）
//! - text: 语音文本预处理与分句
//! - timing: 幻灯片时长策略

pub mod deck;
pub mod script;
pub mod text;
pub mod timing;
