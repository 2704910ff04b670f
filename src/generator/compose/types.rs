use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 消息来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSource {
    /// 模型生成并通过校验
    Generated,
    /// 模型调用失败或结果不可用时的模板消息
    Fallback,
    /// 记录已带有消息，未再次生成
    Existing,
}

impl Display for MessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            MessageSource::Generated => "generated",
            MessageSource::Fallback => "fallback",
            MessageSource::Existing => "existing",
        };
        write!(f, "{}", str)
    }
}
