//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `GUILDA__*` 覆盖（双下划线表示嵌套，如 `GUILDA__APP__RECURSION_LIMIT=12`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub retrieval: RetrievalSection,
    pub recruitment: RecruitmentSection,
}

/// [app] 段：调度上限与对话轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 单轮内最多执行的节点数（Supervisor 与处理器各算一次）
    pub recursion_limit: usize,
    /// 对话历史保留轮数
    pub max_context_turns: usize,
    /// 单次处理器调用超时（秒）
    pub handler_timeout_secs: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "Guilda Agent".to_string(),
            recursion_limit: 10,
            max_context_turns: 20,
            handler_timeout_secs: 120,
        }
    }
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// deepseek / openai；实际后端还取决于哪个 API Key 存在
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub embedding_model: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            temperature: Some(0.0),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

/// [retrieval] 段：机构手册路径与分块参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub manual_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            manual_path: PathBuf::from("institutional_docs/onboarding_manual.md"),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 4,
        }
    }
}

/// [recruitment] 段：候选人简历目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecruitmentSection {
    pub cvs_dir: PathBuf,
}

impl Default for RecruitmentSection {
    fn default() -> Self {
        Self {
            cvs_dir: PathBuf::from("cvs_docs"),
        }
    }
}

/// 从 config 目录加载配置，环境变量 GUILDA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 GUILDA__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default", "default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("GUILDA")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
