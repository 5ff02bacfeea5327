use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use flo_core::prelude::*;
use flo_core::TaskStatus;
use tokio::time::{Instant, sleep, timeout};

type Fanned = TaskRef<(), i32, &'static str>;
type Chained = TaskRef<Option<i32>, i32, &'static str>;

/// Task that settles with `outcome` after `ms` milliseconds.
fn after(ms: u64, outcome: Result<i32, &'static str>) -> Fanned {
    TaskFn::new("after", move |(), done: Done<i32, &'static str>| {
        tokio::spawn(async move {
            sleep(Duration::from_millis(ms)).await;
            done.settle(outcome);
        });
    })
    .boxed()
}

/// Task that logs `start:<tag>` when started and `end:<tag>` right before settling.
fn traced(log: &Arc<Mutex<Vec<String>>>, tag: i32, ms: u64) -> Fanned {
    let log = Arc::clone(log);
    TaskFn::new("traced", move |(), done: Done<i32, &'static str>| {
        log.lock().unwrap().push(format!("start:{tag}"));
        tokio::spawn(async move {
            sleep(Duration::from_millis(ms)).await;
            log.lock().unwrap().push(format!("end:{tag}"));
            done.ok(tag);
        });
    })
    .boxed()
}

fn bounded(n: usize) -> Limit {
    Limit::bounded(n).unwrap()
}

// ---------------------------------------------------------------------------
// serial
// ---------------------------------------------------------------------------

#[tokio::test]
async fn serial_of_nothing_reports_no_error_and_no_result() {
    let out: Result<Option<i32>, &str> = serial(Vec::new()).await;
    assert_eq!(out, Ok(None));
}

#[tokio::test(start_paused = true)]
async fn serial_threads_previous_result_into_next_task() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_second = Arc::clone(&seen);

    let first: Chained = TaskFn::from_future("first", |_| async {
        sleep(Duration::from_millis(30)).await;
        Ok(1)
    })
    .boxed();
    let second: Chained = TaskFn::new("second", move |input, done: Done<i32, &'static str>| {
        seen_by_second.lock().unwrap().push(input);
        tokio::spawn(async move {
            sleep(Duration::from_millis(80)).await;
            done.ok(2);
        });
    })
    .boxed();

    let out = serial(vec![first, second]).await;

    assert_eq!(out, Ok(Some(2)));
    assert_eq!(*seen.lock().unwrap(), vec![Some(1)]);
}

#[tokio::test(start_paused = true)]
async fn serial_never_starts_tasks_after_a_failure() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);

    let failing: Chained = TaskFn::from_future("failing", |_| async {
        sleep(Duration::from_millis(10)).await;
        Err("error")
    })
    .boxed();
    let skipped: Chained = TaskFn::new("skipped", move |_, done: Done<i32, &'static str>| {
        counter.fetch_add(1, Ordering::SeqCst);
        done.ok(2);
    })
    .boxed();

    let out = serial(vec![failing, skipped]).await;

    assert_eq!(out, Err("error"));
    assert_eq!(started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn adapted_function_error_reaches_serial_caller() {
    #[derive(Debug, PartialEq)]
    struct Oops(&'static str);

    let out = serial(vec![make_async(|_: Option<()>| Err::<(), _>(Oops("bad"))).boxed()]).await;
    assert_eq!(out, Err(Oops("bad")));
}

#[tokio::test(start_paused = true)]
async fn adapted_function_can_open_a_chain() {
    let out = serial(vec![
        make_async(|_: Option<i32>| Ok::<_, &'static str>(5)).boxed(),
        TaskFn::from_future("double", |input: Option<i32>| async move {
            sleep(Duration::from_millis(200)).await;
            input.map(|n| n * 2).ok_or("missing input")
        })
        .boxed(),
    ])
    .await;
    assert_eq!(out, Ok(Some(10)));
}

#[tokio::test]
async fn adapted_parser_follows_an_io_like_task() {
    let read: TaskRef<Option<String>, String, String> =
        TaskFn::from_future("read", |_| async { Ok(r#"{"price": 5000}"#.to_string()) }).boxed();
    let parse = make_async_named("parse", |raw: Option<String>| -> Result<String, String> {
        let raw = raw.ok_or_else(|| "no input".to_string())?;
        let price = raw
            .split(':')
            .nth(1)
            .map(|s| s.trim_matches(|c: char| !c.is_ascii_digit()))
            .ok_or_else(|| "no price".to_string())?;
        Ok(price.to_string())
    })
    .boxed();

    let out = serial(vec![read, parse]).await;
    assert_eq!(out, Ok(Some("5000".to_string())));
}

// ---------------------------------------------------------------------------
// parallel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parallel_of_nothing_reports_empty_results() {
    let settled = parallel_unbounded::<i32, &str>(Vec::new()).await;
    assert_eq!(settled.into_parts(), (None, Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn parallel_keeps_index_order_and_overlaps_work() {
    let started = Instant::now();

    let settled = parallel_unbounded(vec![
        after(400, Ok(1)),
        after(100, Ok(2)),
        after(200, Ok(3)),
    ])
    .await;

    assert_eq!(settled.error, None);
    assert_eq!(settled.results, vec![Some(1), Some(2), Some(3)]);
    assert!(started.elapsed() < Duration::from_millis(410));
}

#[tokio::test(start_paused = true)]
async fn limit_above_task_count_starts_everything_at_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = (1..=3).map(|n| traced(&log, n, 50)).collect();

    let settled = parallel(tasks, bounded(5)).await;

    assert_eq!(settled.results, vec![Some(1), Some(2), Some(3)]);
    let log = log.lock().unwrap();
    assert_eq!(&log[..3], ["start:1", "start:2", "start:3"]);
}

#[tokio::test(start_paused = true)]
async fn limit_of_three_runs_all_five_in_order() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let delays = [120, 40, 90, 10, 60];
    let tasks = delays
        .iter()
        .enumerate()
        .map(|(i, &ms)| {
            let (live, max) = (Arc::clone(&in_flight), Arc::clone(&peak));
            TaskFn::new("windowed", move |(), done: Done<i32, &'static str>| {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                max.fetch_max(now, Ordering::SeqCst);
                tokio::spawn(async move {
                    sleep(Duration::from_millis(ms)).await;
                    live.fetch_sub(1, Ordering::SeqCst);
                    done.ok(i as i32 + 1);
                });
            })
            .boxed()
        })
        .collect();

    let settled = parallel(tasks, bounded(3)).await;

    assert_eq!(settled.into_result(), Ok(vec![1, 2, 3, 4, 5]));
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn limit_of_one_runs_strictly_one_at_a_time() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = vec![traced(&log, 1, 50), traced(&log, 2, 100), traced(&log, 3, 30)];

    let settled = parallel(tasks, bounded(1)).await;

    assert_eq!(settled.results, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(
        *log.lock().unwrap(),
        ["start:1", "end:1", "start:2", "end:2", "start:3", "end:3"]
    );
}

#[tokio::test(start_paused = true)]
async fn freed_slot_is_refilled_in_the_same_turn() {
    let started_at = Arc::new(Mutex::new(Vec::new()));
    let origin = Instant::now();

    let tasks = [10u64, 50, 5]
        .into_iter()
        .enumerate()
        .map(|(i, ms)| {
            let started_at = Arc::clone(&started_at);
            TaskFn::new("timed", move |(), done: Done<i32, &'static str>| {
                started_at.lock().unwrap().push((i, origin.elapsed()));
                tokio::spawn(async move {
                    sleep(Duration::from_millis(ms)).await;
                    done.ok(i as i32);
                });
            })
            .boxed()
        })
        .collect();

    parallel(tasks, bounded(2)).await;

    let started_at = started_at.lock().unwrap();
    assert_eq!(started_at.len(), 3);
    let (third, at) = started_at[2];
    assert_eq!(third, 2);
    assert!(at >= Duration::from_millis(10) && at < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn failure_does_not_stop_siblings() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tasks = vec![
        after(10, Err("error")),
        traced(&log, 2, 20),
        traced(&log, 3, 20),
    ];

    let settled = parallel(tasks, bounded(1)).await;

    assert_eq!(settled.error, Some("error"));
    assert_eq!(settled.results, vec![None, Some(2), Some(3)]);
    assert_eq!(
        settled.statuses(),
        [TaskStatus::Failed, TaskStatus::Succeeded, TaskStatus::Succeeded]
    );
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn parallel_reports_error_with_partial_results() {
    let settled = parallel_unbounded(vec![
        after(30, Ok(1)),
        after(10, Err("error")),
        after(20, Ok(3)),
    ])
    .await;

    assert_eq!(settled.error, Some("error"));
    assert_eq!(settled.results, vec![Some(1), None, Some(3)]);
    assert_eq!(settled.failed().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn first_error_is_by_settlement_not_by_index() {
    let settled = parallel_unbounded(vec![
        after(50, Err("late")),
        after(10, Err("early")),
        after(30, Ok(3)),
    ])
    .await;

    assert_eq!(settled.error, Some("early"));
    assert_eq!(settled.results, vec![None, None, Some(3)]);
}

#[tokio::test(start_paused = true)]
async fn unsettled_task_keeps_parallel_pending() {
    let tasks: Vec<Fanned> = vec![
        after(10, Ok(1)),
        TaskFn::new("forgetful", |(), done: Done<i32, &'static str>| drop(done)).boxed(),
    ];

    let out = timeout(Duration::from_secs(5), parallel_unbounded(tasks)).await;
    assert!(out.is_err());
}

#[tokio::test]
async fn separate_calls_do_not_share_state() {
    let left = parallel_unbounded(vec![after(5, Ok(1)), after(1, Err("left"))]);
    let right = parallel_unbounded(vec![after(3, Ok(10)), after(2, Ok(20))]);

    let (left, right) = tokio::join!(left, right);

    assert_eq!(left.into_parts(), (Some("left"), vec![Some(1), None]));
    assert_eq!(right.into_parts(), (None, vec![Some(10), Some(20)]));
}

// ---------------------------------------------------------------------------
// map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Item {
    Num(i32),
    Bad,
}

fn doubler(item: Item, done: Done<i32, &'static str>) {
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        match item {
            Item::Num(n) => done.ok(n * 2),
            Item::Bad => done.err("error"),
        }
    });
}

#[tokio::test]
async fn map_of_nothing_reports_empty_results() {
    let settled = map(Vec::<Item>::new(), doubler).await;
    assert_eq!(settled.into_parts(), (None, Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn map_applies_worker_concurrently() {
    let started = Instant::now();

    let settled = map([Item::Num(1), Item::Num(2), Item::Num(3)], doubler).await;

    assert_eq!(settled.into_result(), Ok(vec![2, 4, 6]));
    assert!(started.elapsed() < Duration::from_millis(110));
}

#[tokio::test(start_paused = true)]
async fn map_reports_error_once_everything_settled() {
    let settled = map([Item::Num(1), Item::Bad, Item::Num(3)], doubler).await;

    assert_eq!(settled.error, Some("error"));
    assert_eq!(settled.results, vec![Some(2), None, Some(6)]);
}
