//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - MockLlmClient：总是以 Final Answer 回显最后一条 User 消息
//! - ScriptedLlmClient：按顺序返回预设回复，并记录每次收到的消息，供测试断言；
//!   token 用量按空白分词计数

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.lines().next().unwrap_or("").trim())
            .unwrap_or("(no input)");

        let answer = serde_json::json!({
            "action": "Final Answer",
            "action_input": format!("Echo from Mock: {}", last_user),
        });
        Ok(format!("```json\n{}\n```", answer))
    }
}

/// 脚本化客户端：回复用完后返回错误
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
            ..Self::default()
        }
    }

    /// 追加一次失败的调用
    pub fn push_error(&self, err: impl Into<String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Err(err.into()));
        }
    }

    /// 已收到的请求（按调用顺序）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(messages.to_vec());
        }
        let reply = self
            .replies
            .lock()
            .map_err(|e| e.to_string())?
            .pop_front()
            .unwrap_or_else(|| Err("scripted replies exhausted".to_string()))?;

        let prompt: usize = messages.iter().map(|m| m.content.split_whitespace().count()).sum();
        self.prompt_tokens.fetch_add(prompt as u64, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(reply.split_whitespace().count() as u64, Ordering::Relaxed);
        Ok(reply)
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        let prompt = self.prompt_tokens.load(Ordering::Relaxed);
        let completion = self.completion_tokens.load(Ordering::Relaxed);
        (prompt, completion, prompt + completion)
    }
}
