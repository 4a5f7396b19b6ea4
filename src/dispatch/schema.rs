//! 决策 JSON Schema（schemars 生成），拼入 Supervisor 的 system prompt

use schemars::{schema_for, JsonSchema};

/// 决策格式：与 decode_decision 接受的 `{"action": "...", "action_input": "..."}` 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct DecisionFormat {
    /// 要调用的处理器名称，或 "Final Answer" 表示直接回复用户
    pub action: String,
    /// 交给处理器的完整任务描述，或给用户的最终回复
    pub action_input: String,
}

pub fn decision_schema_json() -> String {
    let schema = schema_for!(DecisionFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
