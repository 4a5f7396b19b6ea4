//! 任务处理器：机构问答、招聘、计算
//!
//! 每个处理器实现 TaskHandler；HandlerExecutor 负责超时与审计。

pub mod arith;
pub mod calculation;
pub mod executor;
pub mod institutional;
pub mod recruitment;
pub mod registry;
pub mod working_hours;

pub use calculation::{CalculationHandler, CalculationTask};
pub use executor::HandlerExecutor;
pub use institutional::{InstitutionalHandler, ManualSource};
pub use recruitment::RecruitmentHandler;
pub use registry::{HandlerKind, HandlerRegistry, TaskHandler};
pub use working_hours::{total_working_time, working_hours, WorkedTime, WorkingHoursError};
