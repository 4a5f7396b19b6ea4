//! 处理器执行器
//!
//! 持有 HandlerRegistry 与全局超时，execute(kind, input) 在超时内调用处理器，
//! 超时或失败时转为 DispatchError（HandlerTimeout / HandlerFailed）；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::{DispatchError, HandlerReply};
use crate::handlers::{HandlerKind, HandlerRegistry};

pub struct HandlerExecutor {
    registry: HandlerRegistry,
    timeout: Duration,
}

impl HandlerExecutor {
    pub fn new(registry: HandlerRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn execute(
        &self,
        kind: HandlerKind,
        input: &str,
    ) -> Result<HandlerReply, DispatchError> {
        let handler = self
            .registry
            .get(kind)
            .ok_or_else(|| DispatchError::UnknownAction(kind.name().to_string()))?;

        let start = Instant::now();
        let result = timeout(self.timeout, handler.invoke(input)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "handler_audit",
            "handler": kind.name(),
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "input_preview": preview(input),
        });
        tracing::info!(audit = %audit, "handler");

        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(reason)) => Err(DispatchError::HandlerFailed {
                handler: kind.name().to_string(),
                reason,
            }),
            Err(_) => Err(DispatchError::HandlerTimeout(kind.name().to_string())),
        }
    }
}

fn preview(input: &str) -> String {
    if input.chars().count() > 200 {
        format!("{}...", input.chars().take(200).collect::<String>())
    } else {
        input.to_string()
    }
}
