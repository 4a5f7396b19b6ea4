//! 文档检索：分块、索引与排序
//!
//! 机构手册在冷启动时一次性切成固定大小、带重叠的片段（默认 500 字符、重叠 50），
//! 建成后只读。检索时若有嵌入提供方则做向量 + 关键词混合排序（RRF 融合），
//! 否则退化为纯关键词排序。

use std::collections::HashMap;
use std::sync::Arc;

use crate::llm::EmbeddingProvider;
use crate::memory::tokenizer;

/// 文档片段
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// 片段 ID（`{source}_{序号}`）
    pub id: String,
    pub text: String,
    /// 来源文档 ID
    pub source_id: String,
    /// 在原文档中的字节偏移
    pub offset: usize,
}

/// 分块策略
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// 目标块大小（字符数）
    pub chunk_size: usize,
    /// 块之间的重叠（字符数）
    pub chunk_overlap: usize,
    /// 分隔符优先级（从高到低）
    pub separators: Vec<String>,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                ". ".to_string(),
                "。".to_string(),
                "? ".to_string(),
                "! ".to_string(),
                " ".to_string(),
            ],
        }
    }
}

/// 文档分块器：在目标长度内优先按高优先级分隔符断开（UTF-8 安全）
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk(&self, doc_id: &str, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.config.chunk_size.max(1);

        let mut start = 0;
        let mut seq = 0;

        while start < total {
            let target_end = (start + size).min(total);
            let mut end = target_end;

            if target_end < total {
                let window: String = chars[start..target_end].iter().collect();
                for sep in &self.config.separators {
                    if let Some(pos) = window.rfind(sep.as_str()) {
                        let cut = window[..pos].chars().count() + sep.chars().count();
                        // 断点太靠前时继续尝试更低优先级的分隔符
                        if cut > self.config.chunk_overlap {
                            end = start + cut;
                            break;
                        }
                    }
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                let offset: usize = chars[..start].iter().map(|c| c.len_utf8()).sum();
                passages.push(Passage {
                    id: format!("{}_{}", doc_id, seq),
                    text: trimmed.to_string(),
                    source_id: doc_id.to_string(),
                    offset,
                });
                seq += 1;
            }

            if end >= total {
                break;
            }
            let overlap = self.config.chunk_overlap.min(end - start);
            let next = end - overlap;
            start = if next > start { next } else { end };
        }

        passages
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// 检索结果
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub passage: Passage,
    pub score: f32,
}

/// 只读片段索引：构建完成后不再修改，可被多个调度轮次并发读取
pub struct DocumentIndex {
    entries: Vec<(Passage, Vec<f32>)>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl DocumentIndex {
    /// 切块并（可选地）向量化整份文档
    pub async fn build(
        doc_id: &str,
        text: &str,
        chunking: ChunkingConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, String> {
        let passages = Chunker::new(chunking).chunk(doc_id, text);
        let mut entries = Vec::with_capacity(passages.len());
        for passage in passages {
            let embedding = match &embedder {
                Some(e) => e.embed(&passage.text).await?,
                None => Vec::new(),
            };
            entries.push((passage, embedding));
        }
        tracing::info!(doc_id, passages = entries.len(), "document index built");
        Ok(Self { entries, embedder })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 检索最相关的 k 个片段
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>, String> {
        let keyword = self.keyword_ranking(query);
        let embedder = match &self.embedder {
            Some(e) => e,
            None => {
                return Ok(keyword
                    .into_iter()
                    .take(k)
                    .map(|(score, passage)| RetrievalResult {
                        passage: passage.clone(),
                        score,
                    })
                    .collect())
            }
        };

        let query_embedding = embedder.embed(query).await?;
        let mut vector: Vec<(f32, &Passage)> = self
            .entries
            .iter()
            .map(|(p, emb)| (cosine_similarity(&query_embedding, emb), p))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        vector.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        // RRF（Reciprocal Rank Fusion）
        let rrf_k = 60.0;
        let mut scores: HashMap<&str, f32> = HashMap::new();
        for ranking in [&vector, &keyword] {
            for (rank, (_, passage)) in ranking.iter().take(k * 2).enumerate() {
                *scores.entry(passage.id.as_str()).or_insert(0.0) += 1.0 / (rrf_k + rank as f32);
            }
        }

        let mut fused: Vec<RetrievalResult> = self
            .entries
            .iter()
            .filter_map(|(p, _)| {
                scores.get(p.id.as_str()).map(|score| RetrievalResult {
                    passage: p.clone(),
                    score: *score,
                })
            })
            .collect();
        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        fused.truncate(k);
        Ok(fused)
    }

    /// 关键词排序；同分时保持文档顺序
    fn keyword_ranking(&self, query: &str) -> Vec<(f32, &Passage)> {
        let query_tokens = tokenizer::tokenize_to_set(query);
        let mut scored: Vec<(f32, &Passage)> = self
            .entries
            .iter()
            .map(|(p, _)| {
                let tokens = tokenizer::tokenize_to_set(&p.text);
                (tokenizer::jaccard_similarity(&query_tokens, &tokens), p)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

/// 将检索结果拼成 stuff 形式的上下文
pub fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|r| r.passage.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 以几个关键词出现次数作为向量分量
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
            let lower = text.to_lowercase();
            Ok(["vacation", "salary", "badge"]
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect())
        }
    }

    #[test]
    fn test_chunk_respects_size_and_overlap() {
        let chunker = Chunker::new(ChunkingConfig::new(40, 10));
        let text = "word ".repeat(50);
        let passages = chunker.chunk("manual", &text);

        assert!(passages.len() > 1);
        for p in &passages {
            assert!(p.text.chars().count() <= 40);
            assert_eq!(p.source_id, "manual");
        }
        assert_eq!(passages[0].id, "manual_0");
        assert_eq!(passages[0].offset, 0);
        // 相邻片段之间有重叠
        assert!(passages[1].offset < 40);
    }

    #[test]
    fn test_chunk_short_and_empty_documents() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("d", "").is_empty());
        assert!(chunker.chunk("d", "   \n ").is_empty());
        let one = chunker.chunk("d", "Short manual.");
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].text, "Short manual.");
    }

    #[test]
    fn test_chunk_prefers_paragraph_breaks() {
        let chunker = Chunker::new(ChunkingConfig::new(60, 5));
        let text = format!("{}\n\n{}", "a".repeat(30), "b".repeat(50));
        let passages = chunker.chunk("d", &text);
        assert_eq!(passages[0].text, "a".repeat(30));
    }

    #[test]
    fn test_chunking_config_default() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
    }

    #[tokio::test]
    async fn test_keyword_retrieval_without_embedder() {
        let text = "Employees get thirty vacation days per year.\n\n\
                    Salary is paid on the fifth business day.\n\n\
                    Lost badges must be reported to security.";
        let index = DocumentIndex::build("manual", text, ChunkingConfig::new(50, 5), None)
            .await
            .unwrap();
        assert_eq!(index.len(), 3);

        let results = index.retrieve("when is salary paid", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passage.text.contains("Salary"));
    }

    #[tokio::test]
    async fn test_hybrid_retrieval_with_embedder() {
        let text = "Vacation requests need manager approval.\n\n\
                    Badge replacement costs nothing.";
        let index = DocumentIndex::build(
            "manual",
            text,
            ChunkingConfig::new(45, 5),
            Some(Arc::new(KeywordEmbedder)),
        )
        .await
        .unwrap();

        let results = index.retrieve("vacation approval", 2).await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].passage.text.starts_with("Vacation"));
        assert!(format_context(&results).contains("manager approval"));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
