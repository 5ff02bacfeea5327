use std::sync::Arc;

use flo_model::Limit;

use crate::{
    parallel::{Settled, parallel},
    task::{Done, TaskFn, TaskRef},
};

/// Apply `worker` to every item concurrently, all at once.
///
/// Item order is result order. Outcome semantics are those of
/// [`parallel`](crate::parallel).
pub async fn map<X, T, E, W>(items: impl IntoIterator<Item = X>, worker: W) -> Settled<T, E>
where
    X: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    W: Fn(X, Done<T, E>) + Send + Sync + 'static,
{
    map_limit(items, Limit::Unbounded, worker).await
}

/// [`map`] with a concurrency window.
pub async fn map_limit<X, T, E, W>(
    items: impl IntoIterator<Item = X>,
    limit: Limit,
    worker: W,
) -> Settled<T, E>
where
    X: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    W: Fn(X, Done<T, E>) + Send + Sync + 'static,
{
    let worker = Arc::new(worker);
    let tasks: Vec<TaskRef<(), T, E>> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let worker = Arc::clone(&worker);
            TaskFn::new(format!("map[{index}]"), move |(), done| worker(item, done)).boxed()
        })
        .collect();

    parallel(tasks, limit).await
}
