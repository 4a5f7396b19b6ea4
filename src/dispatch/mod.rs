//! 调度层：Supervisor 决策、观察格式化、状态机与循环

pub mod decision;
pub mod events;
pub mod graph;
pub mod loop_;
pub mod observation;
pub mod prompts;
pub mod schema;
pub mod supervisor;

pub use decision::{decode_decision, FINAL_ANSWER};
pub use events::{DispatchEvent, EventSender};
pub use graph::{transition, DispatchNode};
pub use loop_::{run_turn, DispatchContext};
pub use observation::format_observation;
pub use supervisor::Supervisor;
