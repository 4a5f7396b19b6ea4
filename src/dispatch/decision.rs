//! 决策解码：把决策引擎的文本输出严格解析为 Action 或 Final
//!
//! 先在第一个 `Observation: `（带尾随空格）处截断（等价于 stop sequence），再取 ```json / ``` 代码块
//! 或裸 JSON 对象，要求同时包含 `action` 与 `action_input`。

use serde_json::Value;

use crate::core::{AgentAction, DispatchError, Outcome};

/// 决策中表示直接回复用户的 action 值
pub const FINAL_ANSWER: &str = "Final Answer";

/// 模型可能在决策之后继续"脑补"观察结果，这里丢弃
pub const STOP_SEQUENCE: &str = "Observation: ";

/// 截断到 stop sequence 之前
pub fn apply_stop_sequence(text: &str) -> &str {
    match text.find(STOP_SEQUENCE) {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// 从文本中取出 JSON 片段：```json 块 > ``` 块 > 第一个 `{` 到最后一个 `}`
fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        return Some(rest.find("```").map(|end| &rest[..end]).unwrap_or(rest).trim());
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        let body = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
        // 跳过可能的语言标记行
        let body = match body.find('{') {
            Some(brace) => &body[brace..],
            None => body,
        };
        return Some(body.trim());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn field_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 严格解码；失败统一为 DecisionDecode（含原始输出）
pub fn decode_decision(text: &str) -> Result<Outcome, DispatchError> {
    let log = apply_stop_sequence(text).trim();
    let block = extract_json_block(log).ok_or_else(|| {
        DispatchError::DecisionDecode(format!("no json blob found in: {}", log))
    })?;

    let value: Value = serde_json::from_str(block)
        .map_err(|e| DispatchError::DecisionDecode(format!("{}: {}", e, block)))?;

    let action = value
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| {
            DispatchError::DecisionDecode(format!("missing string \"action\" in: {}", block))
        })?;
    let action_input = value.get("action_input").map(field_as_text).ok_or_else(|| {
        DispatchError::DecisionDecode(format!("missing \"action_input\" in: {}", block))
    })?;

    if action == FINAL_ANSWER {
        Ok(Outcome::Final(action_input))
    } else {
        Ok(Outcome::Action(AgentAction {
            handler: action.to_string(),
            task_description: action_input,
            raw_log: log.to_string(),
        }))
    }
}
