//! 调度过程事件：供调用方实时展示决策、委派、观察与最终回复

use serde::Serialize;
use tokio::sync::mpsc;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// 当前第几次节点执行
    StepUpdate { step: usize, limit: usize },
    /// Supervisor 的决策（handler 或 "Final Answer"）
    Decision { action: String, input: String },
    /// 委派给处理器
    HandlerCall { handler: String, input: String },
    /// 处理器返回（预览）
    Observation { handler: String, preview: String },
    /// 错误恢复动作
    Recovery { action: String, detail: String },
    /// 本轮决策引擎 token 消耗（及累计值）
    TokenUsage {
        prompt_tokens: u64,
        completion_tokens: u64,
        total_tokens: u64,
        cumulative_total: u64,
    },
    Final { answer: String },
    Error { text: String },
}

pub type EventSender = mpsc::UnboundedSender<DispatchEvent>;

/// 发送事件；接收端已关闭时忽略
pub(crate) fn emit(tx: Option<&EventSender>, event: DispatchEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}

/// 截断长文本用于事件预览
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
