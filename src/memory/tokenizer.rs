//! 检索用分词
//!
//! 手册与问题可能是中英文混合：含 CJK 字符时用 jieba-rs 搜索引擎模式分词，
//! 否则按空白切分；统一小写并去掉首尾标点，供关键词排序使用。

use std::collections::HashSet;
use std::sync::OnceLock;

use jieba_rs::Jieba;

/// 全局 Jieba 实例（延迟初始化）
static JIEBA: OnceLock<Jieba> = OnceLock::new();

fn get_jieba() -> &'static Jieba {
    JIEBA.get_or_init(Jieba::new)
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{309F}' |
        '\u{30A0}'..='\u{30FF}'
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

fn normalize(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn keep(token: &str) -> bool {
    token.chars().count() > 1 || token.chars().next().map(is_cjk).unwrap_or(false)
}

pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if contains_cjk(text) {
        get_jieba()
            .cut_for_search(text, true)
            .into_iter()
            .map(normalize)
            .filter(|s| keep(s))
            .collect()
    } else {
        text.split_whitespace()
            .map(normalize)
            .filter(|s| keep(s))
            .collect()
    }
}

pub fn tokenize_to_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard 相似度：交集 / 并集
pub fn jaccard_similarity(set1: &HashSet<String>, set2: &HashSet<String>) -> f32 {
    if set1.is_empty() || set2.is_empty() {
        return 0.0;
    }
    let intersection = set1.intersection(set2).count() as f32;
    let union = set1.union(set2).count() as f32;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_english_strips_punctuation() {
        let tokens = tokenize("When is the salary paid? (Monthly.)");
        assert!(tokens.contains(&"salary".to_string()));
        assert!(tokens.contains(&"paid".to_string()));
        assert!(tokens.contains(&"monthly".to_string()));
    }

    #[test]
    fn test_tokenize_chinese() {
        let tokens = tokenize("公司的休假政策");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().any(|t| t.contains("休假") || t.contains("政策")));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("员工手册"));
        assert!(!contains_cjk("Onboarding manual"));
    }

    #[test]
    fn test_jaccard_similarity() {
        let a = tokenize_to_set("vacation days per year");
        let b = tokenize_to_set("how many vacation days");
        assert!(jaccard_similarity(&a, &b) > 0.0);
        assert_eq!(jaccard_similarity(&a, &HashSet::new()), 0.0);
    }
}
