mod limit;
pub use limit::Limit;

mod task_status;
pub use task_status::TaskStatus;

/// Position of a task inside the sequence handed to a runner.
///
/// Result slots, start order and log fields are all keyed by it.
pub type TaskIndex = usize;
