pub mod execute;
pub mod format;
pub mod planner;

pub use execute::{execute_plan, ExecutionFailure, ExecutionReport, Executor, FsExecutor, RenameMode};
pub use format::{Formatter, JellyfinFormatter};
pub use planner::{PathPlanner, RenameEntry, RenamePlan};
