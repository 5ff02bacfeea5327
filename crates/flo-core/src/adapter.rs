use std::borrow::Cow;

use crate::task::TaskFn;

/// Lift a plain fallible function into a task.
///
/// The function runs synchronously when the task is started and the task
/// settles before `start` returns: `Ok(v)` is reported as the result, `Err(e)`
/// as the task's error. Functions that do not care about their input simply
/// ignore it, which makes the same task usable at any position of a
/// [`serial`](crate::serial) chain.
pub fn make_async<I, T, E, F>(f: F) -> TaskFn<I, T, E>
where
    I: 'static,
    T: 'static,
    E: 'static,
    F: FnOnce(I) -> Result<T, E> + Send + 'static,
{
    make_async_named("sync", f)
}

/// Same as [`make_async`], with an explicit task name for log events.
pub fn make_async_named<I, T, E, F>(name: impl Into<Cow<'static, str>>, f: F) -> TaskFn<I, T, E>
where
    I: 'static,
    T: 'static,
    E: 'static,
    F: FnOnce(I) -> Result<T, E> + Send + 'static,
{
    TaskFn::new(name, move |input, done| done.settle(f(input)))
}
