//! 机构处理器：基于公司手册的检索问答
//!
//! 输入是一个问题而不是任务叙述。手册索引在第一次调用时构建（冷启动），
//! 之后整个进程只读复用；回答只依据检索到的片段生成。

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::core::HandlerReply;
use crate::handlers::{HandlerKind, TaskHandler};
use crate::llm::{EmbeddingProvider, LlmClient};
use crate::memory::{format_context, ChunkingConfig, DocumentIndex, Message};

const DESCRIPTION: &str = "Responsible for addressing inquiries related to company policies \
and institutional procedures. This includes questions about deadlines, benefits, and other \
institutional guidelines. ";

fn qa_system_prompt(context: &str) -> String {
    format!(
        "Answer any use questions based solely on the context below:\n\n<context>\n{}\n</context>",
        context
    )
}

/// 手册索引的构建参数
#[derive(Debug, Clone)]
pub struct ManualSource {
    pub path: PathBuf,
    pub chunking: ChunkingConfig,
    pub top_k: usize,
}

pub struct InstitutionalHandler {
    llm: Arc<dyn LlmClient>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    source: ManualSource,
    index: OnceCell<DocumentIndex>,
}

impl InstitutionalHandler {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        source: ManualSource,
    ) -> Self {
        Self {
            llm,
            embedder,
            source,
            index: OnceCell::new(),
        }
    }

    /// 唯一的索引构建点；失败不会缓存，下次调用重试
    pub async fn index(&self) -> Result<&DocumentIndex, String> {
        self.index
            .get_or_try_init(|| async {
                let text = tokio::fs::read_to_string(&self.source.path)
                    .await
                    .map_err(|e| format!("read manual {}: {}", self.source.path.display(), e))?;
                let doc_id = self
                    .source
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("manual")
                    .to_string();
                DocumentIndex::build(
                    &doc_id,
                    &text,
                    self.source.chunking.clone(),
                    self.embedder.clone(),
                )
                .await
            })
            .await
    }
}

#[async_trait]
impl TaskHandler for InstitutionalHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Institutional
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<HandlerReply, String> {
        let index = self.index().await?;
        let passages = index.retrieve(input, self.source.top_k).await?;
        tracing::debug!(question = input, passages = passages.len(), "manual passages retrieved");

        let answer = self
            .llm
            .complete(&[
                Message::system(qa_system_prompt(&format_context(&passages))),
                Message::user(input),
            ])
            .await?;
        Ok(HandlerReply::Text(answer))
    }
}
