pub mod enums;
pub mod project;
pub mod stats;
pub mod task;
pub mod template;

pub use enums::Priority;
pub use project::Project;
pub use stats::Stats;
pub use task::{Subtask, Task, TaskPatch};
pub use template::{Blueprint, Template, TemplatePatch};
