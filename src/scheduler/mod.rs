/// Expiring-task scheduler: store contract, handler registry and poller
mod policy;
mod poller;
mod registry;
mod store;
mod types;

// Re-export public types and functions
pub use policy::{Disposition, disposition};
pub use poller::{Scheduler, TickOutcome};
pub use registry::{HandlerRegistry, TaskHandler};
pub use store::{MemoryTaskStore, TaskStore};
pub use types::{Completion, NewTask, Task, TaskKind};
