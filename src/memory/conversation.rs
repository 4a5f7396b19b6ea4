//! 对话历史
//!
//! 保留最近 N 轮对话（user/assistant 对），超出时自动剪枝；只由顶层 Dispatcher 在一轮成功后追加。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 短期记忆：最近 N 轮对话（每轮含 user + assistant，故实际保留约 max_turns*2 条消息）
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    /// 追加一轮完整对话（用户输入 + 最终回复），只在轮次成功结束时调用
    pub fn push_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 超出 max_turns*2 时丢弃最旧的消息，保留最近部分
    fn prune(&mut self) {
        if self.messages.len() > self.max_turns * 2 {
            let keep = self.max_turns * 2;
            self.messages.drain(..self.messages.len() - keep);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_turn_appends_pair() {
        let mut mem = ConversationMemory::new(5);
        mem.push(Message::assistant("Hi! How can I assist you today?"));
        mem.push_turn("How many vacation days?", "Thirty.");
        assert_eq!(mem.len(), 3);
        assert_eq!(mem.messages()[1], Message::user("How many vacation days?"));
        assert_eq!(mem.messages()[2].role, Role::Assistant);
    }

    #[test]
    fn test_prune_keeps_latest_turns() {
        let mut mem = ConversationMemory::new(2);
        for i in 0..5 {
            mem.push_turn(format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(mem.len(), 4);
        assert_eq!(mem.messages()[0].content, "q3");
        mem.clear();
        assert!(mem.is_empty());
    }
}
