//! 调度集成测试：脚本化决策引擎 + 真实/桩处理器跑完整轮次

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use guilda::agent::{DispatchComponents, Dispatcher, GREETING};
use guilda::core::{DispatchError, HandlerReply};
use guilda::dispatch::DispatchEvent;
use guilda::handlers::{
    CalculationHandler, HandlerKind, HandlerRegistry, InstitutionalHandler, ManualSource,
    TaskHandler,
};
use guilda::llm::{LlmClient, ScriptedLlmClient};
use guilda::memory::{ChunkingConfig, Message};

/// 记录收到的输入并返回固定文本
struct Recording {
    kind: HandlerKind,
    reply: &'static str,
    inputs: Mutex<Vec<String>>,
}

impl Recording {
    fn new(kind: HandlerKind, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply,
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskHandler for Recording {
    fn kind(&self) -> HandlerKind {
        self.kind
    }

    fn description(&self) -> &str {
        "records every task"
    }

    async fn invoke(&self, input: &str) -> Result<HandlerReply, String> {
        self.inputs.lock().unwrap().push(input.to_string());
        Ok(HandlerReply::Message(Message::assistant(self.reply)))
    }
}

fn action(handler: &str, input: &str) -> String {
    format!(
        "Thought: delegate.\n```json\n{}\n```",
        serde_json::json!({"action": handler, "action_input": input})
    )
}

fn final_answer(answer: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({"action": "Final Answer", "action_input": answer})
    )
}

fn dispatcher(llm: Arc<ScriptedLlmClient>, registry: HandlerRegistry, limit: usize) -> Dispatcher {
    Dispatcher::new(DispatchComponents::new(llm, registry, limit, 5), 20)
}

#[tokio::test]
async fn test_working_hours_routed_through_calculation() {
    let llm = Arc::new(ScriptedLlmClient::new([
        action(
            "calculation_agent",
            "Compute the total working time for the punches 09:00, 12:00, 13:00, 17:00",
        ),
        final_answer("You worked 7 hours and 0 minutes today."),
    ]));
    let mut registry = HandlerRegistry::new();
    registry.register(CalculationHandler::new(None));
    let mut dispatcher = dispatcher(llm.clone(), registry, 10);

    let answer = dispatcher
        .submit("I punched 09:00, 12:00, 13:00 and 17:00. How long did I work?")
        .await
        .unwrap();
    assert_eq!(answer, "You worked 7 hours and 0 minutes today.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    let second_human = &requests[1].last().unwrap().content;
    assert!(second_human.contains(
        "Though: I already called the calculation_agent to delegate a task. \nObservation: The agent returned: \n7 hours and 0 minutes "
    ));
    assert_eq!(dispatcher.history().len(), 3);
}

#[tokio::test]
async fn test_invalid_punches_flow_back_to_supervisor() {
    let llm = Arc::new(ScriptedLlmClient::new([
        action("calculation_agent", "Punches: 09:00, 12:00, 13:00"),
        final_answer("Please check your punches, one seems to be missing."),
    ]));
    let mut registry = HandlerRegistry::new();
    registry.register(CalculationHandler::new(None));
    let mut dispatcher = dispatcher(llm.clone(), registry, 10);

    let answer = dispatcher.submit("How long did I work?").await.unwrap();
    assert!(answer.contains("missing"));
    assert!(llm.requests()[1]
        .last()
        .unwrap()
        .content
        .contains("Could not calculate"));
}

#[tokio::test]
async fn test_final_answer_returned_unchanged() {
    let llm = Arc::new(ScriptedLlmClient::new([final_answer("**Hello!** How can I help?")]));
    let mut dispatcher = dispatcher(llm, HandlerRegistry::new(), 10);
    assert_eq!(
        dispatcher.submit("hi").await.unwrap(),
        "**Hello!** How can I help?"
    );
    assert_eq!(dispatcher.history()[0], Message::assistant(GREETING));
}

#[tokio::test]
async fn test_each_handler_receives_action_input() {
    let recruitment = Recording::new(HandlerKind::Recruitment, "Ana fits best.");
    let institutional = Recording::new(HandlerKind::Institutional, "Thirty days.");
    let llm = Arc::new(ScriptedLlmClient::new([
        action("recruitment_agent", "Rank the data engineering candidates"),
        action("institutional_agent", "How many vacation days do new hires get?"),
        final_answer("Ana fits best and gets thirty vacation days."),
    ]));
    let mut registry = HandlerRegistry::new();
    registry.register_arc(recruitment.clone());
    registry.register_arc(institutional.clone());
    let mut dispatcher = dispatcher(llm, registry, 10);

    dispatcher.submit("Who should we hire, and what vacation do they get?").await.unwrap();
    assert_eq!(recruitment.inputs(), vec!["Rank the data engineering candidates"]);
    assert_eq!(
        institutional.inputs(),
        vec!["How many vacation days do new hires get?"]
    );
}

#[tokio::test]
async fn test_always_action_hits_recursion_limit() {
    let handler = Recording::new(HandlerKind::Calculation, "Answer: 2");
    let llm = Arc::new(ScriptedLlmClient::new(
        (0..20).map(|_| action("calculation_agent", "1 + 1")),
    ));
    let mut registry = HandlerRegistry::new();
    registry.register_arc(handler.clone());
    let mut dispatcher = dispatcher(llm, registry, 4);

    let err = dispatcher.submit("loop forever").await.unwrap_err();
    assert!(matches!(err, DispatchError::RecursionLimit { limit: 4 }));
    // Supervisor, handler, supervisor, handler
    assert_eq!(handler.inputs().len(), 2);
    assert_eq!(dispatcher.history().len(), 1);
}

#[tokio::test]
async fn test_unknown_action_is_fatal() {
    let llm = Arc::new(ScriptedLlmClient::new([
        action("hr_agent", "anything"),
        final_answer("never reached"),
    ]));
    let mut dispatcher = dispatcher(llm.clone(), HandlerRegistry::new(), 10);
    let err = dispatcher.submit("hello").await.unwrap_err();
    assert!(matches!(err, DispatchError::UnknownAction(ref a) if a == "hr_agent"));
    assert_eq!(llm.remaining(), 1);
    assert_eq!(dispatcher.history().len(), 1);
}

#[tokio::test]
async fn test_decode_retry_then_success() {
    let llm = Arc::new(ScriptedLlmClient::new([
        "I would call the calculation agent now.".to_string(),
        final_answer("Done."),
    ]));
    let mut dispatcher = dispatcher(llm, HandlerRegistry::new(), 10);
    assert_eq!(dispatcher.submit("hello").await.unwrap(), "Done.");
}

#[tokio::test]
async fn test_empty_input_rejected() {
    let llm = Arc::new(ScriptedLlmClient::default());
    let mut dispatcher = dispatcher(llm.clone(), HandlerRegistry::new(), 10);
    assert!(matches!(
        dispatcher.submit("   ").await.unwrap_err(),
        DispatchError::EmptyInput
    ));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_deterministic_with_scripted_collaborators() {
    async fn run() -> (String, Vec<Vec<Message>>) {
        let llm = Arc::new(ScriptedLlmClient::new([
            action("calculation_agent", "punches 08:00 12:00 13:00 18:30"),
            final_answer("9 hours and 30 minutes"),
        ]));
        let mut registry = HandlerRegistry::new();
        registry.register(CalculationHandler::new(None));
        let mut dispatcher = dispatcher(llm.clone(), registry, 10);
        let answer = dispatcher.submit("hours?").await.unwrap();
        (answer, llm.requests())
    }

    let (a1, r1) = run().await;
    let (a2, r2) = run().await;
    assert_eq!(a1, a2);
    assert_eq!(r1, r2);
}

#[tokio::test]
async fn test_events_cover_the_turn() {
    let llm = Arc::new(ScriptedLlmClient::new([
        action("calculation_agent", "12 * 3"),
        final_answer("36"),
    ]));
    let mut registry = HandlerRegistry::new();
    registry.register(CalculationHandler::new(None));
    let mut dispatcher = dispatcher(llm.clone(), registry, 10);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    dispatcher.submit_with_events("what is 12 * 3?", tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(DispatchEvent::StepUpdate { step: 1, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        DispatchEvent::Observation { handler, preview } if handler == "calculation_agent" && preview == "Answer: 36"
    )));
    assert!(matches!(events.last(), Some(DispatchEvent::Final { answer }) if answer == "36"));

    let (_, _, cumulative) = llm.token_usage();
    assert!(cumulative > 0);
    assert!(events.iter().any(|e| matches!(
        e,
        DispatchEvent::TokenUsage { total_tokens, cumulative_total, .. }
            if *total_tokens == cumulative && *cumulative_total == cumulative
    )));
}

#[tokio::test]
async fn test_institutional_answers_from_manual() {
    let manual = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    std::fs::write(
        manual.path(),
        "Salaries are paid on the fifth business day.\n\nVacation is thirty days per year.",
    )
    .unwrap();

    let llm = Arc::new(ScriptedLlmClient::new([
        action("institutional_agent", "When are salaries paid?"),
        "On the fifth business day.".to_string(),
        final_answer("Salaries are paid on the fifth business day."),
    ]));
    let mut registry = HandlerRegistry::new();
    registry.register(InstitutionalHandler::new(
        llm.clone(),
        None,
        ManualSource {
            path: manual.path().to_path_buf(),
            chunking: ChunkingConfig::new(60, 5),
            top_k: 1,
        },
    ));
    let mut dispatcher = dispatcher(llm.clone(), registry, 10);

    let answer = dispatcher.submit("When do I get paid?").await.unwrap();
    assert_eq!(answer, "Salaries are paid on the fifth business day.");

    let requests = llm.requests();
    assert!(requests[1][0].content.contains("fifth business day"));
    assert_eq!(requests[1][1].content, "When are salaries paid?");
    assert!(requests[2]
        .last()
        .unwrap()
        .content
        .contains("The agent returned: \nOn the fifth business day. "));
}
