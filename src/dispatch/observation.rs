//! 观察格式化：把上一个处理器的结果写成下一次决策的草稿（scratchpad）

use serde_json::Value;

use crate::core::{HandlerReply, Outcome};

/// 结果取值：文本直接用；带 content 的消息/结构取 content；其余取字符串化的值
fn result_text(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Pending => None,
        Outcome::Observed(HandlerReply::Text(text)) => Some(text.clone()),
        Outcome::Observed(HandlerReply::Message(message)) => Some(message.content.clone()),
        Outcome::Observed(HandlerReply::Structured(value)) => Some(match value.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

pub fn format_observation(handler_name: &str, outcome: &Outcome) -> String {
    match result_text(outcome) {
        None => String::new(),
        Some(result) => format!(
            "Though: I already called the {} to delegate a task. \nObservation: The agent returned: \n{} ",
            handler_name, result
        ),
    }
}
