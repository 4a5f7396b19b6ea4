//! 调度错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 DispatchError 决定 RetryWithPrompt 或 Abort。
//! 结构性错误（解码失败、未知动作、递归上限）终止当前轮次；
//! 处理器层面的输入校验失败不走这里，而是作为文本结果回流给 Supervisor。

use thiserror::Error;

/// 单轮调度过程中可能出现的错误
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Empty user input")]
    EmptyInput,

    /// 决策引擎输出无法解码为 {action, action_input}
    #[error("Decision decode error: {0}")]
    DecisionDecode(String),

    /// 决策引擎点名了不存在的处理器
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Recursion limit of {limit} reached without a final answer")]
    RecursionLimit { limit: usize },

    #[error("Handler {handler} failed: {reason}")]
    HandlerFailed { handler: String, reason: String },

    #[error("Handler timeout: {0}")]
    HandlerTimeout(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// 状态机收到不可能出现的 (状态, 结果) 组合
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    /// 将提示注入下一次决策请求，让 LLM 重试（如 JSON 格式错误）
    RetryWithPrompt(String),
    /// 终止当前轮次
    Abort,
}
