//! 处理器注册表
//!
//! 所有任务处理器实现 TaskHandler（kind / description / invoke），由 HandlerRegistry 按种类注册与查找，
//! HandlerExecutor 在调用时加超时并统一转 DispatchError。

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::HandlerReply;

/// 三种处理器；名称即决策引擎 action 字段中使用的标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerKind {
    Institutional,
    Recruitment,
    Calculation,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [
        HandlerKind::Institutional,
        HandlerKind::Recruitment,
        HandlerKind::Calculation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::Institutional => "institutional_agent",
            HandlerKind::Recruitment => "recruitment_agent",
            HandlerKind::Calculation => "calculation_agent",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerKind::ALL
            .into_iter()
            .find(|k| k.name() == s.trim())
            .ok_or_else(|| format!("unknown handler: {s}"))
    }
}

/// 处理器 trait：同步语义（await 到结果为止），本层不做重试
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn kind(&self) -> HandlerKind;

    /// 供决策引擎理解的能力描述
    fn description(&self) -> &str;

    /// 执行一次委派；输入校验类问题应以文本结果返回，只有协作方故障才返回 Err
    async fn invoke(&self, input: &str) -> Result<HandlerReply, String>;
}

/// 按种类存储 Arc<dyn TaskHandler>；BTreeMap 保证描述输出顺序稳定
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<HandlerKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl TaskHandler + 'static) {
        self.handlers.insert(handler.kind(), Arc::new(handler));
    }

    pub fn register_arc(&mut self, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: HandlerKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<HandlerKind> {
        self.handlers.keys().copied().collect()
    }

    /// 返回 (name, description) 列表，用于生成 Supervisor 提示词中的处理器段落
    pub fn descriptions(&self) -> Vec<(&'static str, String)> {
        self.handlers
            .iter()
            .map(|(kind, h)| (kind.name(), h.description().to_string()))
            .collect()
    }
}
