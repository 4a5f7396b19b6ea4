//! 调度循环：在 Supervisor 与处理器之间交替，直到 Final 或递归上限
//!
//! 每一轮新建 ConversationState；历史只读传入，本模块从不写历史。
//! 递归上限按节点执行次数计（Supervisor 与处理器各算一次）。

use tracing::Instrument;

use crate::core::{ActiveHandler, ConversationState, DispatchError, Outcome};
use crate::dispatch::decision::FINAL_ANSWER;
use crate::dispatch::events::{emit, preview, DispatchEvent, EventSender};
use crate::dispatch::graph::{transition, DispatchNode};
use crate::dispatch::supervisor::Supervisor;
use crate::handlers::HandlerExecutor;
use crate::memory::Message;

/// 单轮调度所需的全部协作方
pub struct DispatchContext<'a> {
    pub supervisor: &'a Supervisor,
    pub executor: &'a HandlerExecutor,
    pub recursion_limit: usize,
    pub events: Option<&'a EventSender>,
}

/// 路由边界上的适配：所有处理器都收到 Supervisor 写好的独立任务描述（action_input）
fn delegated_input(outcome: &Outcome) -> Result<String, DispatchError> {
    match outcome {
        Outcome::Action(action) => Ok(action.task_description.clone()),
        other => Err(DispatchError::InvalidTransition(format!(
            "handler entered without an action: {:?}",
            other
        ))),
    }
}

/// 执行一个用户轮次，返回最终答案
pub async fn run_turn(
    ctx: &DispatchContext<'_>,
    user_input: &str,
    history: &[Message],
) -> Result<String, DispatchError> {
    let turn_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("turn", turn_id = %turn_id);
    let (init_prompt, init_completion, _) = ctx.supervisor.token_usage();
    let result = drive(ctx, user_input, history).instrument(span).await;

    let (cur_prompt, cur_completion, cur_total) = ctx.supervisor.token_usage();
    let prompt_tokens = cur_prompt.saturating_sub(init_prompt);
    let completion_tokens = cur_completion.saturating_sub(init_completion);
    tracing::info!(
        %turn_id,
        prompt_tokens,
        completion_tokens,
        cumulative_total = cur_total,
        "turn token usage"
    );
    emit(
        ctx.events,
        DispatchEvent::TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cumulative_total: cur_total,
        },
    );

    match &result {
        Ok(answer) => emit(
            ctx.events,
            DispatchEvent::Final {
                answer: answer.clone(),
            },
        ),
        Err(e) => {
            tracing::warn!(%turn_id, error = %e, "turn failed");
            emit(ctx.events, DispatchEvent::Error { text: e.to_string() });
        }
    }
    result
}

async fn drive(
    ctx: &DispatchContext<'_>,
    user_input: &str,
    history: &[Message],
) -> Result<String, DispatchError> {
    let mut state = ConversationState::new(user_input, history.to_vec());
    let mut node = DispatchNode::START;
    let mut steps = 0usize;

    while !node.is_terminal() {
        if steps >= ctx.recursion_limit {
            return Err(DispatchError::RecursionLimit {
                limit: ctx.recursion_limit,
            });
        }
        steps += 1;
        emit(
            ctx.events,
            DispatchEvent::StepUpdate {
                step: steps,
                limit: ctx.recursion_limit,
            },
        );

        match node {
            DispatchNode::Supervisor => {
                let outcome = ctx.supervisor.decide(&state, ctx.events).await?;
                let (action, input) = match &outcome {
                    Outcome::Action(a) => (a.handler.clone(), a.task_description.clone()),
                    other => (FINAL_ANSWER.to_string(), other.to_string()),
                };
                tracing::info!(step = steps, %action, "supervisor decided");
                emit(ctx.events, DispatchEvent::Decision { action, input });
                state.record(outcome, ActiveHandler::Supervisor);
            }
            DispatchNode::Handler(kind) => {
                let input = delegated_input(state.outcome())?;
                emit(
                    ctx.events,
                    DispatchEvent::HandlerCall {
                        handler: kind.name().to_string(),
                        input: input.clone(),
                    },
                );
                let reply = ctx.executor.execute(kind, &input).await?;
                let observed = Outcome::Observed(reply);
                emit(
                    ctx.events,
                    DispatchEvent::Observation {
                        handler: kind.name().to_string(),
                        preview: preview(&observed.to_string(), 200),
                    },
                );
                state.record(observed, ActiveHandler::Handler(kind));
            }
            DispatchNode::Terminated => break,
        }

        node = transition(node, state.outcome())?;
        tracing::info!(step = steps, next = %node, "transition");
    }

    state.into_final_answer().ok_or_else(|| {
        DispatchError::InvalidTransition("terminated without a final answer".to_string())
    })
}
