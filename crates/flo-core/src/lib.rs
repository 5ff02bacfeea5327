//! # flo-core
//!
//! Flow control for callback-style tasks.
//!
//! A task is started once with an input and a [`Done`] completion handle, and
//! reports exactly one `Result` through that handle, either right away or later
//! from whatever asynchronous machinery it owns.
//!
//! | Runner        | Input threading          | On error                               |
//! |---------------|--------------------------|----------------------------------------|
//! | [`serial`]    | previous result → next   | stops the chain, later tasks never run |
//! | [`parallel`]  | none                     | siblings keep running, first error wins |
//! | [`map`]       | one item per task        | same as [`parallel`]                   |
//!
//! [`make_async`] lifts a plain fallible function into a task that settles
//! synchronously.
//!
//! ## Example
//! ```no_run
//! use flo_core::{Limit, TaskFn, parallel};
//!
//! # async fn demo() {
//! let tasks = (1..=3)
//!     .map(|n| TaskFn::from_future(format!("task-{n}"), move |()| async move { Ok::<_, String>(n) }).boxed())
//!     .collect();
//!
//! let settled = parallel(tasks, Limit::bounded(2).unwrap()).await;
//! assert_eq!(settled.results, vec![Some(1), Some(2), Some(3)]);
//! # }
//! ```

mod adapter;
pub use adapter::{make_async, make_async_named};

mod map;
pub use map::{map, map_limit};

mod parallel;
pub use parallel::{Settled, parallel, parallel_unbounded};

mod serial;
pub use serial::serial;

mod task;
pub use task::{Done, Settlement, Task, TaskFn, TaskRef};

pub use flo_model::{Limit, TaskIndex, TaskStatus};

pub mod prelude {
    pub use crate::{
        Done, Limit, Settled, Task, TaskFn, TaskRef, make_async, make_async_named, map,
        map_limit, parallel, parallel_unbounded, serial,
    };
}
