//! 调度状态机：节点与纯转移函数
//!
//! Supervisor --Final--> Terminated
//! Supervisor --Action(H)--> H
//! H --always--> Supervisor
//!
//! 转移只依赖 (当前节点, 最新 outcome)，不做 IO。

use std::fmt;

use crate::core::{DispatchError, Outcome};
use crate::handlers::HandlerKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchNode {
    Supervisor,
    Handler(HandlerKind),
    Terminated,
}

impl DispatchNode {
    pub const START: DispatchNode = DispatchNode::Supervisor;

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchNode::Terminated)
    }
}

impl fmt::Display for DispatchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchNode::Supervisor => f.write_str("supervisor"),
            DispatchNode::Handler(kind) => f.write_str(kind.name()),
            DispatchNode::Terminated => f.write_str("terminated"),
        }
    }
}

/// 根据刚执行完的节点及其产出决定下一个节点
pub fn transition(node: DispatchNode, outcome: &Outcome) -> Result<DispatchNode, DispatchError> {
    match (node, outcome) {
        (DispatchNode::Supervisor, Outcome::Final(_)) => Ok(DispatchNode::Terminated),
        (DispatchNode::Supervisor, Outcome::Action(action)) => action
            .handler
            .parse::<HandlerKind>()
            .map(DispatchNode::Handler)
            .map_err(|_| DispatchError::UnknownAction(action.handler.clone())),
        (DispatchNode::Handler(_), Outcome::Observed(_)) => Ok(DispatchNode::Supervisor),
        (DispatchNode::Terminated, _) => Err(DispatchError::InvalidTransition(
            "terminated is final".to_string(),
        )),
        (node, outcome) => Err(DispatchError::InvalidTransition(format!(
            "{} cannot produce {:?}",
            node, outcome
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgentAction, HandlerReply};

    fn action(handler: &str) -> Outcome {
        Outcome::Action(AgentAction {
            handler: handler.to_string(),
            task_description: "task".to_string(),
            raw_log: String::new(),
        })
    }

    #[test]
    fn test_supervisor_routes_to_named_handler() {
        for kind in HandlerKind::ALL {
            assert_eq!(
                transition(DispatchNode::Supervisor, &action(kind.name())).unwrap(),
                DispatchNode::Handler(kind)
            );
        }
    }

    #[test]
    fn test_final_terminates() {
        let next = transition(DispatchNode::Supervisor, &Outcome::Final("ok".into())).unwrap();
        assert!(next.is_terminal());
    }

    #[test]
    fn test_handler_returns_to_supervisor() {
        let observed = Outcome::Observed(HandlerReply::text("7 hours and 0 minutes"));
        assert_eq!(
            transition(DispatchNode::Handler(HandlerKind::Calculation), &observed).unwrap(),
            DispatchNode::Supervisor
        );
    }

    #[test]
    fn test_unknown_action() {
        let err = transition(DispatchNode::Supervisor, &action("hr_agent")).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownAction(ref a) if a == "hr_agent"));
    }

    #[test]
    fn test_impossible_combinations() {
        assert!(matches!(
            transition(DispatchNode::Supervisor, &Outcome::Pending),
            Err(DispatchError::InvalidTransition(_))
        ));
        assert!(matches!(
            transition(DispatchNode::Handler(HandlerKind::Recruitment), &Outcome::Final("x".into())),
            Err(DispatchError::InvalidTransition(_))
        ));
        assert!(matches!(
            transition(DispatchNode::Terminated, &Outcome::Final("x".into())),
            Err(DispatchError::InvalidTransition(_))
        ));
    }
}
