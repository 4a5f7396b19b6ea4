//! 计算处理器：工时计算与算术
//!
//! 任务描述是自然语言，工时计算只接受显式的打卡列表：
//! - JSON 打卡列表（`{"clock_punches": [...]}` 或 `["09:00", ...]`）→ 工时计算
//! - 去掉打卡时间后仍能抽出算术表达式 → 本地求值
//! - 文本中的打卡时间彼此只以空白、逗号或 and 分隔，且至少两个 → 按出现顺序做工时计算
//! - 其余（如 "from 09:00 to 17:00 with a break from 12:00 to 13:00"）交给语言模型整理成
//!   打卡列表或单个表达式；没有语言模型时请用户显式列出打卡
//!
//! 校验失败（打卡数、区间、表达式）都作为文本结果返回，让 Supervisor 回头询问用户。

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;

use crate::core::HandlerReply;
use crate::handlers::arith::{evaluate, extract_expression, format_number};
use crate::handlers::working_hours::working_hours;
use crate::handlers::{HandlerKind, TaskHandler};
use crate::llm::LlmClient;
use crate::memory::Message;

const DESCRIPTION: &str = "Performs calculations related to time tracking and working hours, \
including computing total hours worked, managing time logs, and performing other \
time-related calculations. ";

const PUNCHES_NEEDED: &str = "Could not calculate. The clock punches are not an explicit list. \
NEVER invent intervals. Give it back to human and request the clock punches in chronological \
order using 24-hour time, e.g. [\"09:00\", \"12:00\", \"13:00\", \"17:00\"].";

const NO_EXPRESSION: &str = "Could not calculate. The task does not contain a mathematical \
expression or clock punches. Give it back to human and request the missing values.";

/// 工时计算的结构化输入
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkingHoursArgs {
    /// 按时间顺序排列的打卡时间，24 小时制 HH:MM，进、出交替出现
    #[serde(alias = "punches")]
    pub clock_punches: Vec<String>,
}

fn structure_prompt() -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(WorkingHoursArgs)).unwrap_or_default();
    format!(
        "You prepare inputs for a calculator.\n\
        If the task asks for working hours, list every clock punch stated in the task in \
        chronological order using 24-hour time (HH:MM). A break from A to B inside a shift \
        from S to E becomes S, A, B, E. NEVER invent punches that the task does not state. \
        Respond with a JSON object following this schema:\n{}\n\
        exactly like:\n```json\n{{\"clock_punches\": [\"08:00\", \"12:00\"]}}\n```\n\
        Otherwise translate the math problem into a single expression that a calculator can \
        evaluate. Use only numbers, parentheses and the operators + - * / % ^. \
        Respond with the expression inside a fenced block, exactly like:\n\
        ```text\n<expression>\n```",
        schema
    )
}

/// 打卡时间：0:00 – 23:59
fn punch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("static punch regex is valid")
    })
}

/// 列表中相邻打卡之间允许出现的内容
fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[\s,;]*(?:(?:and|&)[\s,;]*)?$").expect("static separator regex is valid")
    })
}

fn json_slice(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// JSON 形式的打卡列表
fn explicit_punch_list(text: &str) -> Option<Vec<String>> {
    let from_object = json_slice(text, '{', '}')
        .and_then(|s| serde_json::from_str::<WorkingHoursArgs>(s).ok())
        .map(|args| args.clock_punches);
    let punches = match from_object {
        Some(p) => p,
        None => json_slice(text, '[', ']')
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())?,
    };
    let punches: Vec<String> = punches.into_iter().map(|p| p.trim().to_string()).collect();
    (!punches.is_empty()).then_some(punches)
}

/// 文本中紧挨着的一串打卡时间，归一化为 `HH:MM`
fn bare_punch_list(text: &str) -> Option<Vec<String>> {
    let mut punches = Vec::new();
    let mut last_end: Option<usize> = None;
    for caps in punch_regex().captures_iter(text) {
        let whole = caps.get(0)?;
        if let Some(end) = last_end {
            if !separator_regex().is_match(&text[end..whole.start()]) {
                return None;
            }
        }
        punches.push(format!("{:0>2}:{}", &caps[1], &caps[2]));
        last_end = Some(whole.end());
    }
    (punches.len() >= 2).then_some(punches)
}

/// 计算任务的显式意图
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationTask {
    /// 按给定顺序的打卡序列
    WorkingHours(Vec<String>),
    /// 已抽出的算术表达式
    Arithmetic(String),
    /// 需要语言模型整理的原始描述
    Unstructured(String),
}

impl CalculationTask {
    pub fn classify(task: &str) -> Self {
        if let Some(punches) = explicit_punch_list(task) {
            return CalculationTask::WorkingHours(punches);
        }
        let without_punches = punch_regex().replace_all(task, " ");
        if let Some(expression) = extract_expression(&without_punches) {
            return CalculationTask::Arithmetic(expression);
        }
        match bare_punch_list(task) {
            Some(punches) => CalculationTask::WorkingHours(punches),
            None => CalculationTask::Unstructured(task.to_string()),
        }
    }
}

fn total_for(punches: &[String]) -> String {
    tracing::debug!(?punches, "working hours task");
    working_hours(punches).unwrap_or_else(|e| e.to_string())
}

fn answer_for(expression: &str) -> String {
    tracing::debug!(%expression, "evaluating expression");
    match evaluate(expression) {
        Ok(value) => format!("Answer: {}", format_number(value)),
        Err(e) => format!("Could not calculate '{}': {}.", expression, e),
    }
}

pub struct CalculationHandler {
    /// 用于整理无法直接计算的描述；None 时只处理显式输入
    llm: Option<Arc<dyn LlmClient>>,
}

impl CalculationHandler {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { llm }
    }

    async fn structure(&self, task: &str) -> Result<String, String> {
        let Some(llm) = &self.llm else {
            let text = if punch_regex().is_match(task) {
                PUNCHES_NEEDED
            } else {
                NO_EXPRESSION
            };
            return Ok(text.to_string());
        };

        let reply = llm
            .complete(&[Message::system(structure_prompt()), Message::user(task)])
            .await?;
        if let Some(punches) = explicit_punch_list(&reply) {
            return Ok(total_for(&punches));
        }
        Ok(match extract_expression(&reply) {
            Some(expression) => answer_for(&expression),
            None => format!(
                "Could not calculate. Neither clock punches nor a mathematical expression could \
                be derived from: {}",
                task.trim()
            ),
        })
    }
}

#[async_trait]
impl TaskHandler for CalculationHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Calculation
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<HandlerReply, String> {
        let text = match CalculationTask::classify(input) {
            CalculationTask::WorkingHours(punches) => total_for(&punches),
            CalculationTask::Arithmetic(expression) => answer_for(&expression),
            CalculationTask::Unstructured(task) => self.structure(&task).await?,
        };
        Ok(HandlerReply::Message(Message::assistant(text)))
    }
}
