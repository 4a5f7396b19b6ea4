//! Supervisor：一次决策周期
//!
//! 由状态组装提示词（system + 历史 + human/scratchpad），调用决策引擎并严格解码。
//! 解码失败时按 RecoveryEngine 的建议带纠错提示重试一次，第二次失败即为致命错误。

use std::sync::Arc;

use crate::core::{ConversationState, DispatchError, Outcome, RecoveryAction, RecoveryEngine};
use crate::dispatch::decision::decode_decision;
use crate::dispatch::events::{emit, DispatchEvent, EventSender};
use crate::dispatch::observation::format_observation;
use crate::dispatch::prompts::{build_supervisor_messages, supervisor_system_prompt};
use crate::llm::LlmClient;

pub struct Supervisor {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    recovery: RecoveryEngine,
}

impl Supervisor {
    /// `handlers` 为 (name, description)，通常来自 HandlerRegistry::descriptions
    pub fn new(llm: Arc<dyn LlmClient>, handlers: &[(&str, String)]) -> Self {
        Self {
            llm,
            system_prompt: supervisor_system_prompt(handlers),
            recovery: RecoveryEngine::new(),
        }
    }

    /// 获取决策引擎累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    pub async fn decide(
        &self,
        state: &ConversationState,
        events: Option<&EventSender>,
    ) -> Result<Outcome, DispatchError> {
        if state.input().trim().is_empty() {
            return Err(DispatchError::EmptyInput);
        }

        let scratchpad = match state.active_handler() {
            Some(producer) => format_observation(producer.name(), state.outcome()),
            None => String::new(),
        };

        match self.request(state, &scratchpad, None).await {
            Err(err @ DispatchError::DecisionDecode(_)) => match self.recovery.handle(&err) {
                RecoveryAction::RetryWithPrompt(hint) => {
                    tracing::warn!(error = %err, "decision decode failed, retrying once");
                    emit(
                        events,
                        DispatchEvent::Recovery {
                            action: "retry_with_prompt".to_string(),
                            detail: err.to_string(),
                        },
                    );
                    self.request(state, &scratchpad, Some(&hint)).await
                }
                RecoveryAction::Abort => Err(err),
            },
            other => other,
        }
    }

    async fn request(
        &self,
        state: &ConversationState,
        scratchpad: &str,
        correction: Option<&str>,
    ) -> Result<Outcome, DispatchError> {
        let messages = build_supervisor_messages(
            &self.system_prompt,
            state.history(),
            state.input(),
            scratchpad,
            correction,
        );
        tracing::debug!(scratchpad, retry = correction.is_some(), "supervisor prompt");
        let text = self
            .llm
            .complete(&messages)
            .await
            .map_err(DispatchError::Llm)?;
        decode_decision(&text)
    }
}
