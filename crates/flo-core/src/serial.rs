use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

use crate::task::{Done, Settlement, Task, TaskRef};

/// Run `tasks` one after another, feeding each task the previous result.
///
/// The first task receives `None`, every later task `Some(previous result)`.
/// Resolves to:
/// - `Ok(None)` for an empty chain;
/// - `Ok(Some(last))` when every task succeeded;
/// - `Err(e)` with the first reported error. Tasks after the failing one are
///   never started.
#[instrument(level = "debug", skip_all, fields(total = tasks.len()))]
pub async fn serial<T, E>(tasks: Vec<TaskRef<Option<T>, T, E>>) -> Result<Option<T>, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let total = tasks.len();
    let (tx, mut rx) = mpsc::unbounded_channel::<Settlement<T, E>>();
    let mut carried: Option<T> = None;

    for (index, task) in tasks.into_iter().enumerate() {
        trace!(target: "flo.core.serial", index, task = task.name(), "start");
        task.start(carried.take(), Done::new(index, tx.clone()));

        // `tx` stays alive for the whole chain, so `recv` only returns once
        // the running task has reported.
        let Some(Settlement { result, .. }) = rx.recv().await else {
            unreachable!("serial runner holds a sender for the whole chain");
        };

        match result {
            Ok(value) => {
                trace!(target: "flo.core.serial", index, "settled");
                carried = Some(value);
            }
            Err(error) => {
                debug!(
                    target: "flo.core.serial",
                    index,
                    skipped = total - index - 1,
                    "task failed; chain stopped"
                );
                return Err(error);
            }
        }
    }

    debug!(target: "flo.core.serial", "chain completed");
    Ok(carried)
}
