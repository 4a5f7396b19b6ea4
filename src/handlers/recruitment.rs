//! 招聘处理器：候选人简历摘要 + 基于摘要回答委派任务
//!
//! 简历目录固定（配置 `[recruitment].cvs_dir`），只读取 `.txt` / `.md`。
//! 每份简历生成一段摘要（以加粗的候选人标题开头，接 `SUMMARY:`），
//! 按目录枚举顺序用 `"\n\n---\n\n"` 连接后交给语言模型完成任务。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::core::HandlerReply;
use crate::handlers::{HandlerKind, TaskHandler};
use crate::llm::LlmClient;
use crate::memory::Message;

pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

const DESCRIPTION: &str = "Handles all tasks related to candidate selection and evaluation, \
including screening applications, assessing qualifications, and providing recommendations \
for hiring decisions. The agent has a database with candidates curriculums, so you don't \
need to request to the human candidates information. ";

const RECRUITER_PROMPT: &str = "You are a recruitment assistant. Use the candidate summaries \
below to complete the task you are given. Base every statement on the summaries and say so \
when the information is not available.";

/// 单份候选人文档
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    /// 文件名（不含扩展名），作为候选人标题的兜底
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

fn summarization_prompt(context: &str) -> String {
    format!(
        "Write a summary of the following curriculum vitae: \n{} \n\nStart with **Summary of 'person_name' \nSUMMARY: ",
        context
    )
}

/// 按文件名顺序读取目录下的候选人文档
pub fn load_candidate_documents(dir: &Path) -> Result<Vec<CandidateDocument>, String> {
    if !dir.is_dir() {
        return Err(format!("candidate directory not found: {}", dir.display()));
    }
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "txt" | "md"))
            .unwrap_or(false);
        if !entry.file_type().is_file() || !supported {
            continue;
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("candidate")
            .to_string();
        docs.push(CandidateDocument {
            name,
            path: path.to_path_buf(),
            text,
        });
    }
    Ok(docs)
}

/// 确保摘要以加粗标题 + SUMMARY: 开头
fn normalize_summary(name: &str, generated: &str) -> String {
    let generated = generated.trim();
    if generated.starts_with("**") {
        generated.to_string()
    } else {
        format!("**Summary of {}**\nSUMMARY: {}", name, generated)
    }
}

pub struct RecruitmentHandler {
    llm: Arc<dyn LlmClient>,
    cvs_dir: PathBuf,
}

impl RecruitmentHandler {
    pub fn new(llm: Arc<dyn LlmClient>, cvs_dir: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            cvs_dir: cvs_dir.into(),
        }
    }

    /// 为目录中每份简历生成摘要并连接
    pub async fn summarize_candidates(&self) -> Result<String, String> {
        let docs = load_candidate_documents(&self.cvs_dir)?;
        let mut summaries = Vec::with_capacity(docs.len());
        for doc in &docs {
            let generated = self
                .llm
                .complete(&[Message::user(summarization_prompt(&doc.text))])
                .await?;
            summaries.push(normalize_summary(&doc.name, &generated));
        }
        tracing::info!(candidates = summaries.len(), "candidate summaries generated");
        Ok(summaries.join(SUMMARY_SEPARATOR))
    }
}

#[async_trait]
impl TaskHandler for RecruitmentHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Recruitment
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, input: &str) -> Result<HandlerReply, String> {
        let summaries = self.summarize_candidates().await?;
        if summaries.is_empty() {
            return Ok(HandlerReply::Message(Message::assistant(format!(
                "No candidate curriculums were found in {}.",
                self.cvs_dir.display()
            ))));
        }
        let answer = self
            .llm
            .complete(&[
                Message::system(RECRUITER_PROMPT),
                Message::user(format!(
                    "Task: {}\n\nCandidate summaries:\n\n{}",
                    input.trim(),
                    summaries
                )),
            ])
            .await?;
        Ok(HandlerReply::Message(Message::assistant(answer)))
    }
}
