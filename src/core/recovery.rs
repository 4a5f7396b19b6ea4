//! 错误恢复引擎
//!
//! 根据 DispatchError 类型返回 RecoveryAction，供 Supervisor 决定是重试还是终止。

use crate::core::{DispatchError, RecoveryAction};

/// 语义化错误恢复：解码失败给出纠正提示，其余一律终止
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &DispatchError) -> RecoveryAction {
        match err {
            DispatchError::DecisionDecode(raw) => RecoveryAction::RetryWithPrompt(format!(
                "Your previous reply could not be parsed as a decision: {raw}. \
                Respond with ONLY one json blob with an \"action\" key and an \
                \"action_input\" key, for example: \
                {{\"action\": \"Final Answer\", \"action_input\": \"...\"}}"
            )),
            _ => RecoveryAction::Abort,
        }
    }
}
