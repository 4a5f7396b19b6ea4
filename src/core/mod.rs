//! 核心层：错误与恢复、对话状态

pub mod error;
pub mod recovery;
pub mod state;

pub use error::{DispatchError, RecoveryAction};
pub use recovery::RecoveryEngine;
pub use state::{ActiveHandler, AgentAction, ConversationState, HandlerReply, Outcome};
