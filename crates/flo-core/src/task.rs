use std::{borrow::Cow, fmt, future::Future};

use flo_model::TaskIndex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{trace, warn};

/// One completion report: which task settled and how.
#[derive(Debug)]
pub struct Settlement<T, E> {
    pub index: TaskIndex,
    pub result: Result<T, E>,
}

/// Completion handle handed to a task when it is started.
///
/// Reporting consumes the handle, so a task can settle at most once.
/// Dropping it without reporting leaves the task unsettled, and the runner
/// that started it keeps waiting.
pub struct Done<T, E> {
    index: TaskIndex,
    tx: Option<UnboundedSender<Settlement<T, E>>>,
}

impl<T, E> Done<T, E> {
    pub(crate) fn new(index: TaskIndex, tx: UnboundedSender<Settlement<T, E>>) -> Self {
        Self {
            index,
            tx: Some(tx),
        }
    }

    /// Position of the task this handle belongs to.
    #[inline]
    pub fn index(&self) -> TaskIndex {
        self.index
    }

    /// Report the task's outcome.
    pub fn settle(mut self, result: Result<T, E>) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let index = self.index;
        if tx.send(Settlement { index, result }).is_err() {
            trace!(target: "flo.core.task", index, "runner is gone; settlement discarded");
        }
    }

    #[inline]
    pub fn ok(self, value: T) {
        self.settle(Ok(value));
    }

    #[inline]
    pub fn err(self, error: E) {
        self.settle(Err(error));
    }
}

impl<T, E> Drop for Done<T, E> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(
                target: "flo.core.task",
                index = self.index,
                "completion handle dropped without settling; the owning runner will not finish"
            );
        }
    }
}

impl<T, E> fmt::Debug for Done<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("index", &self.index)
            .field("settled", &self.tx.is_none())
            .finish()
    }
}

/// A unit of work that receives an input and settles through a [`Done`] handle.
///
/// `start` takes the task by value: no runner can start the same task twice.
pub trait Task<I, T, E>: Send {
    /// Name used in log events.
    fn name(&self) -> &str;

    /// Begin the work. The task may settle before returning or at any later point.
    fn start(self: Box<Self>, input: I, done: Done<T, E>);
}

/// Boxed task, the element type of every task sequence.
pub type TaskRef<I, T, E> = Box<dyn Task<I, T, E>>;

type Body<I, T, E> = Box<dyn FnOnce(I, Done<T, E>) + Send>;

/// Closure-backed [`Task`].
pub struct TaskFn<I, T, E> {
    name: Cow<'static, str>,
    body: Body<I, T, E>,
}

impl<I: 'static, T: 'static, E: 'static> TaskFn<I, T, E> {
    /// Callback-style task: `f` gets the input and the completion handle.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce(I, Done<T, E>) + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(f),
        }
    }

    /// Future-style task: the future returned by `f` is spawned on the current
    /// tokio runtime and its output is reported as the task's outcome.
    ///
    /// `f` itself runs synchronously when the task is started.
    pub fn from_future<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce(I) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send,
        E: Send,
    {
        Self::new(name, move |input, done: Done<T, E>| {
            let fut = f(input);
            tokio::spawn(async move {
                done.settle(fut.await);
            });
        })
    }

    #[inline]
    pub fn boxed(self) -> TaskRef<I, T, E> {
        Box::new(self)
    }
}

impl<I: 'static, T: 'static, E: 'static> Task<I, T, E> for TaskFn<I, T, E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(self: Box<Self>, input: I, done: Done<T, E>) {
        (self.body)(input, done);
    }
}

impl<I, T, E> fmt::Debug for TaskFn<I, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn done_reports_once_with_its_index() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement<u8, &str>>();
        let done = Done::new(4, tx);
        assert_eq!(done.index(), 4);

        done.ok(9);

        let s = rx.try_recv().expect("settlement sent");
        assert_eq!(s.index, 4);
        assert_eq!(s.result, Ok(9));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_done_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement<u8, &str>>();
        drop(Done::new(0, tx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn settle_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel::<Settlement<u8, &str>>();
        drop(rx);
        Done::new(1, tx).err("late");
    }

    #[test]
    fn task_fn_passes_input_and_handle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = TaskFn::new("double", |n: u32, done: Done<u32, ()>| done.ok(n * 2)).boxed();
        assert_eq!(task.name(), "double");

        task.start(21, Done::new(0, tx));

        assert_eq!(rx.try_recv().unwrap().result, Ok(42));
    }

    #[tokio::test]
    async fn from_future_reports_future_output() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = TaskFn::from_future("later", |n: u32| async move {
            tokio::task::yield_now().await;
            if n > 0 { Ok(n) } else { Err("zero") }
        });

        Box::new(task).start(0, Done::new(3, tx));

        let s = rx.recv().await.unwrap();
        assert_eq!(s.index, 3);
        assert_eq!(s.result, Err("zero"));
    }
}
