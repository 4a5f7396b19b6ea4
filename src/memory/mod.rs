//! 记忆层：对话历史（短期）与文档检索索引

pub mod conversation;
pub mod rag;
pub mod tokenizer;

pub use conversation::{ConversationMemory, Message, Role};
pub use rag::{format_context, ChunkingConfig, Chunker, DocumentIndex, Passage, RetrievalResult};
