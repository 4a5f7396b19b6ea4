//! LLM 客户端抽象
//!
//! 决策引擎与各处理器内部的生成能力都通过 LlmClient 访问：输入消息列表，返回整段文本。
//! 每次调用无状态，历史由调用方显式传入。

use async_trait::async_trait;

use crate::memory::Message;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
