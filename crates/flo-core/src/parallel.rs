use flo_model::{Limit, TaskIndex, TaskStatus};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, instrument, trace, warn};

use crate::task::{Done, Settlement, Task, TaskRef};

/// Terminal outcome of [`parallel`] and [`map`](crate::map).
///
/// `results[i]` is task `i`'s result, or `None` if task `i` failed.
/// `error` is the error of the first task to fail, by settlement order.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T, E> {
    pub error: Option<E>,
    pub results: Vec<Option<T>>,
    statuses: Vec<TaskStatus>,
}

impl<T, E> Settled<T, E> {
    /// Returns `true` if no task failed.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Final status of every task, index-aligned with `results`.
    pub fn statuses(&self) -> &[TaskStatus] {
        &self.statuses
    }

    /// Indices of the tasks that reported an error, in index order.
    pub fn failed(&self) -> impl Iterator<Item = TaskIndex> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == TaskStatus::Failed)
            .map(|(i, _)| i)
    }

    pub fn into_parts(self) -> (Option<E>, Vec<Option<T>>) {
        (self.error, self.results)
    }

    /// Collapse into a plain `Result`, dropping partial results on failure.
    pub fn into_result(self) -> Result<Vec<T>, E> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.results.into_iter().flatten().collect()),
        }
    }
}

/// Activation record of one `parallel` invocation.
struct Aggregate<T, E> {
    results: Vec<Option<T>>,
    statuses: Vec<TaskStatus>,
    first_error: Option<E>,
    settled: usize,
    in_flight: usize,
}

impl<T, E> Aggregate<T, E> {
    fn new(total: usize) -> Self {
        Self {
            results: std::iter::repeat_with(|| None).take(total).collect(),
            statuses: vec![TaskStatus::Pending; total],
            first_error: None,
            settled: 0,
            in_flight: 0,
        }
    }

    #[inline]
    fn total(&self) -> usize {
        self.results.len()
    }

    #[inline]
    fn is_complete(&self) -> bool {
        self.settled == self.total()
    }

    fn mark_started(&mut self, index: TaskIndex) {
        self.statuses[index] = TaskStatus::Running;
        self.in_flight += 1;
    }

    /// Record one settlement. Returns `false` if it was ignored.
    fn record(&mut self, settlement: Settlement<T, E>) -> bool {
        let Settlement { index, result } = settlement;

        let status = self.statuses.get(index).copied();
        if status != Some(TaskStatus::Running) {
            warn!(
                target: "flo.core.parallel",
                index,
                status = ?status,
                "settlement for a task that is not running; ignored"
            );
            return false;
        }

        self.in_flight -= 1;
        self.settled += 1;

        match result {
            Ok(value) => {
                self.results[index] = Some(value);
                self.statuses[index] = TaskStatus::Succeeded;
            }
            Err(error) => {
                self.statuses[index] = TaskStatus::Failed;
                if self.first_error.is_none() {
                    self.first_error = Some(error);
                } else {
                    trace!(target: "flo.core.parallel", index, "later error dropped");
                }
            }
        }

        trace!(
            target: "flo.core.parallel",
            index,
            status = %self.statuses[index],
            settled = self.settled,
            in_flight = self.in_flight,
            "settled"
        );
        true
    }

    fn launch(
        &mut self,
        index: TaskIndex,
        task: TaskRef<(), T, E>,
        tx: &UnboundedSender<Settlement<T, E>>,
    ) {
        self.mark_started(index);
        trace!(
            target: "flo.core.parallel",
            index,
            task = task.name(),
            in_flight = self.in_flight,
            "start"
        );
        task.start((), Done::new(index, tx.clone()));
    }

    fn finish(self) -> Settled<T, E> {
        Settled {
            error: self.first_error,
            results: self.results,
            statuses: self.statuses,
        }
    }
}

/// Run every task, keeping at most `limit` of them in flight.
///
/// Tasks start in index order. With a bounded limit the first `limit` tasks
/// start immediately, and each settlement, successful or not, starts the next
/// pending task before anything else happens. A failing task never stops its
/// siblings. Resolves once, after the last task settled.
#[instrument(level = "debug", skip_all, fields(total = tasks.len(), limit = %limit))]
pub async fn parallel<T, E>(tasks: Vec<TaskRef<(), T, E>>, limit: Limit) -> Settled<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let total = tasks.len();
    let mut agg = Aggregate::new(total);
    if total == 0 {
        debug!(target: "flo.core.parallel", "nothing to run");
        return agg.finish();
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut pending = tasks.into_iter().enumerate();

    for (index, task) in pending.by_ref().take(limit.window(total)) {
        agg.launch(index, task, &tx);
    }

    // `tx` is held until the loop ends, so `recv` never yields `None` here.
    while let Some(settlement) = rx.recv().await {
        if agg.record(settlement)
            && let Some((index, task)) = pending.next()
        {
            agg.launch(index, task, &tx);
        }
        if agg.is_complete() {
            break;
        }
    }

    let settled = agg.finish();
    debug!(
        target: "flo.core.parallel",
        failed = settled.failed().count(),
        "all tasks settled"
    );
    settled
}

/// [`parallel`] without a concurrency limit.
pub async fn parallel_unbounded<T, E>(tasks: Vec<TaskRef<(), T, E>>) -> Settled<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    parallel(tasks, Limit::Unbounded).await
}
