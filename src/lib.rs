//! Guilda - 监督者调度的 HR 助手
//!
//! 模块划分：
//! - **agent**: 无头运行时（组件构建 + 持有历史的 Dispatcher）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 对话状态、错误与恢复
//! - **dispatch**: Supervisor 决策、观察格式化、状态机与调度循环
//! - **handlers**: 机构问答 / 招聘 / 计算处理器与执行器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、嵌入
//! - **memory**: 对话历史与手册检索索引

pub mod agent;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod handlers;
pub mod llm;
pub mod memory;

pub use agent::{create_dispatch_components, DispatchComponents, Dispatcher};
