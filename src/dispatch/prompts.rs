//! Supervisor 提示词
//!
//! system：处理器名称与能力描述、JSON blob 决策格式、合法 action 列表；
//! human：`{input}\n\n{scratchpad} \n\n` + 提醒。历史消息夹在二者之间。

use crate::dispatch::decision::FINAL_ANSWER;
use crate::dispatch::schema::decision_schema_json;
use crate::memory::Message;

pub const JSON_REMINDER: &str = "Reminder to ALWAYS respond with a valid json blob no matter what.";

/// 由 (name, description) 列表生成 Supervisor 的 system 指令
pub fn supervisor_system_prompt(handlers: &[(&str, String)]) -> String {
    let agents = handlers
        .iter()
        .map(|(name, desc)| format!("{}: {}", name, desc))
        .collect::<Vec<_>>()
        .join("\n");
    let members = handlers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::new();
    prompt.push_str("\nYou are an HR supervisor that manages a conversation between the following agents: \n");
    prompt.push_str(&agents);
    prompt.push_str(
        "\n\nEach agent will perform a task and respond with their results. \
        Use the agents result to give a response to the human.",
    );
    prompt.push_str(
        "\n\nThe answers must be as detailed as possible. Use Markdown for better visualization.",
    );
    prompt.push_str(
        "\n\nAlways use a json blob by providing an action key and an action_input key \
        with content between double quotes. ",
    );
    prompt.push_str(&format!(
        "\n\nValid \"action\" values: {} or \"{}\"",
        members, FINAL_ANSWER
    ));
    prompt.push_str("\n\nProvide only ONE action per $JSON_BLOB, as shown: ");
    prompt.push_str(
        "\n\n``` \n{ \n\"action\": An \"agent_name\" to call or \"Final Answer\" to talk to human \
        \n\"action_input\": Task description for the agent or response to the human\n} \n``` ",
    );
    prompt.push_str("\n\nThe $JSON_BLOB must follow this JSON Schema:\n");
    prompt.push_str(&decision_schema_json());
    prompt.push_str(
        "\n\nThe agent has no memory, so you must contextualize as much as possible the task \
        and provide all the details and parameters necessary to solve it standalone. ",
    );
    prompt.push_str(
        "\n\nIf the human didn't provide the necessary parameters for the task, ask the human \
        with 'Final Answer' for them. If the agent encountered problems executing the task, \
        ask the human to adjust their request based on the agent's guidance. ",
    );
    prompt.push_str(
        "\n\nIf the human's request is not related to your agents, gently point out that your \
        agents do not yet have this capability. Use the json blob! ",
    );
    prompt.push_str(
        "\n\nIf you able able to respond the human directly based on the chat history, \
        go ahead carefully. Use the json blob! ",
    );
    prompt.push_str("\n\nBegin! Reminder to ALWAYS respond with a valid json blob of a single action. ");
    prompt
}

/// human 消息：输入 + 观察草稿 + 格式提醒
pub fn human_prompt(input: &str, scratchpad: &str) -> String {
    format!("{}\n\n{} \n\n{}", input, scratchpad, JSON_REMINDER)
}

/// 组装一次决策请求：system + 历史 + human（+ 可选的纠错提示）
pub fn build_supervisor_messages(
    system: &str,
    history: &[Message],
    input: &str,
    scratchpad: &str,
    correction: Option<&str>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(system));
    messages.extend_from_slice(history);
    messages.push(Message::user(human_prompt(input, scratchpad)));
    if let Some(hint) = correction {
        messages.push(Message::user(hint));
    }
    messages
}
