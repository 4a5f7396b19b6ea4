//! 对话状态：单轮调度中贯穿每次状态转移的可变记录
//!
//! 每个用户轮次新建一份（输入 + 当前历史），在转移之间原地修改，
//! 拿到最终答案后丢弃；历史只由顶层调用方在轮次结束后追加。

use std::fmt;

use serde_json::Value;

use crate::handlers::HandlerKind;
use crate::memory::Message;

/// Supervisor 决定委派的任务
#[derive(Clone, Debug, PartialEq)]
pub struct AgentAction {
    /// 决策中的 action 字段（原样保留，路由时再解析为 HandlerKind）
    pub handler: String,
    /// 决策中的 action_input 字段
    pub task_description: String,
    /// 决策引擎的原始输出
    pub raw_log: String,
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw_log.is_empty() {
            write!(f, "{}: {}", self.handler, self.task_description)
        } else {
            f.write_str(&self.raw_log)
        }
    }
}

/// 处理器返回值的三种形态，对应观察格式化的三条取值规则
#[derive(Clone, Debug, PartialEq)]
pub enum HandlerReply {
    /// 直接的文本结果（如检索问答的答案）
    Text(String),
    /// 带 content 字段的消息（如 LLM 生成的助手消息）
    Message(Message),
    /// 其它结构化结果
    Structured(Value),
}

impl HandlerReply {
    pub fn text(s: impl Into<String>) -> Self {
        HandlerReply::Text(s.into())
    }
}

/// 最近一次决策或处理器结果
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Outcome {
    #[default]
    Pending,
    Action(AgentAction),
    /// 处理器结果：形状上属于 action 一侧，只供观察格式化使用，不参与路由
    Observed(HandlerReply),
    Final(String),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Outcome::Final(_))
    }

    pub fn final_answer(&self) -> Option<&str> {
        match self {
            Outcome::Final(answer) => Some(answer),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => Ok(()),
            Outcome::Action(action) => action.fmt(f),
            Outcome::Observed(HandlerReply::Text(s)) => f.write_str(s),
            Outcome::Observed(HandlerReply::Message(m)) => f.write_str(&m.content),
            Outcome::Observed(HandlerReply::Structured(v)) => write!(f, "{}", v),
            Outcome::Final(answer) => f.write_str(answer),
        }
    }
}

/// 产生当前 outcome 的组件
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveHandler {
    Supervisor,
    Handler(HandlerKind),
}

impl ActiveHandler {
    pub fn name(&self) -> &'static str {
        match self {
            ActiveHandler::Supervisor => "supervisor",
            ActiveHandler::Handler(kind) => kind.name(),
        }
    }
}

impl fmt::Display for ActiveHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单轮调度状态
#[derive(Clone, Debug)]
pub struct ConversationState {
    input: String,
    history: Vec<Message>,
    outcome: Outcome,
    active_handler: Option<ActiveHandler>,
}

impl ConversationState {
    pub fn new(input: impl Into<String>, history: Vec<Message>) -> Self {
        Self {
            input: input.into(),
            history,
            outcome: Outcome::Pending,
            active_handler: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// outcome 为 Pending 时总是 None
    pub fn active_handler(&self) -> Option<ActiveHandler> {
        if self.outcome.is_pending() {
            None
        } else {
            self.active_handler
        }
    }

    /// 同时写入 outcome 与其生产者，两者始终成对更新
    pub fn record(&mut self, outcome: Outcome, by: ActiveHandler) {
        self.outcome = outcome;
        self.active_handler = Some(by);
    }

    /// 取出最终答案（仅在 Final 时）
    pub fn into_final_answer(self) -> Option<String> {
        match self.outcome {
            Outcome::Final(answer) => Some(answer),
            _ => None,
        }
    }
}
