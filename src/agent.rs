//! 无头调度运行时
//!
//! create_dispatch_components 按配置构建 LLM、三个处理器、HandlerExecutor 与 Supervisor；
//! Dispatcher 持有对话历史，submit 对单条用户输入跑一轮调度，成功后才追加 user + assistant 两条消息。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::DispatchError;
use crate::dispatch::{run_turn, DispatchContext, DispatchEvent, Supervisor};
use crate::handlers::{
    CalculationHandler, HandlerExecutor, HandlerRegistry, InstitutionalHandler, ManualSource,
    RecruitmentHandler,
};
use crate::llm::{create_embedder_from_config, create_llm_from_config, EmbeddingProvider, LlmClient};
use crate::memory::{ChunkingConfig, ConversationMemory, Message};

/// 新会话的第一条助手消息
pub const GREETING: &str = "Hi! How can I assist you today?";

/// 致命错误时展示给用户的通用提示（具体错误只进日志）
pub const FAILURE_MESSAGE: &str =
    "Sorry, I could not complete your request. Please try again or rephrase it.";

/// 预构建的调度组件，可多轮复用
pub struct DispatchComponents {
    pub supervisor: Supervisor,
    pub executor: HandlerExecutor,
    pub recursion_limit: usize,
}

impl DispatchComponents {
    /// 由已注册的处理器构建；Supervisor 的处理器段落取自注册表描述
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: HandlerRegistry,
        recursion_limit: usize,
        handler_timeout_secs: u64,
    ) -> Self {
        let supervisor = Supervisor::new(llm, &registry.descriptions());
        Self {
            supervisor,
            executor: HandlerExecutor::new(registry, handler_timeout_secs),
            recursion_limit,
        }
    }

    pub fn context<'a>(&'a self, events: Option<&'a mpsc::UnboundedSender<DispatchEvent>>) -> DispatchContext<'a> {
        DispatchContext {
            supervisor: &self.supervisor,
            executor: &self.executor,
            recursion_limit: self.recursion_limit,
            events,
        }
    }
}

/// 注册三个处理器：机构问答、招聘、计算
pub fn default_registry(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(InstitutionalHandler::new(
        llm.clone(),
        embedder,
        ManualSource {
            path: cfg.retrieval.manual_path.clone(),
            chunking: ChunkingConfig::new(cfg.retrieval.chunk_size, cfg.retrieval.chunk_overlap),
            top_k: cfg.retrieval.top_k,
        },
    ));
    registry.register(RecruitmentHandler::new(
        llm.clone(),
        cfg.recruitment.cvs_dir.clone(),
    ));
    registry.register(CalculationHandler::new(Some(llm)));
    registry
}

/// 从配置创建调度组件：LLM 后端、嵌入（可选）、处理器、超时与递归上限
pub fn create_dispatch_components(cfg: &AppConfig) -> DispatchComponents {
    let llm = create_llm_from_config(cfg);
    let embedder = create_embedder_from_config(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.embedding_model,
        None,
    );
    let registry = default_registry(cfg, llm.clone(), embedder);
    DispatchComponents::new(
        llm,
        registry,
        cfg.app.recursion_limit,
        cfg.app.handler_timeout_secs,
    )
}

/// 会话入口：持有历史，逐条提交用户输入
pub struct Dispatcher {
    components: DispatchComponents,
    memory: ConversationMemory,
}

impl Dispatcher {
    pub fn new(components: DispatchComponents, max_turns: usize) -> Self {
        let mut memory = ConversationMemory::new(max_turns);
        memory.push(Message::assistant(GREETING));
        Self { components, memory }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(create_dispatch_components(cfg), cfg.app.max_context_turns)
    }

    pub fn history(&self) -> &[Message] {
        self.memory.messages()
    }

    /// 清空历史，只保留问候语
    pub fn clear(&mut self) {
        self.memory.clear();
        self.memory.push(Message::assistant(GREETING));
    }

    pub async fn submit(&mut self, input: &str) -> Result<String, DispatchError> {
        self.submit_inner(input, None).await
    }

    /// 同 submit，并通过 event_tx 推送 StepUpdate / Decision / HandlerCall / Observation 等事件
    pub async fn submit_with_events(
        &mut self,
        input: &str,
        event_tx: mpsc::UnboundedSender<DispatchEvent>,
    ) -> Result<String, DispatchError> {
        self.submit_inner(input, Some(&event_tx)).await
    }

    async fn submit_inner(
        &mut self,
        input: &str,
        events: Option<&mpsc::UnboundedSender<DispatchEvent>>,
    ) -> Result<String, DispatchError> {
        let ctx = self.components.context(events);
        let answer = run_turn(&ctx, input, self.memory.messages()).await?;
        self.memory.push_turn(input, answer.clone());
        Ok(answer)
    }
}
