//! # ClusterManager: run independent tasks concurrently and aggregate failures.
//!
//! ## Flow
//! ```text
//! add_task(t0) add_task(t1) ... add_task(tN-1)     (pending set, no execution)
//!        │
//! run_tasks()
//!   ├─► take pending set
//!   ├─► tokio::spawn(t_i.execute())  for every i   (one execution unit per task)
//!   │      └─ on completion: Success / Error event  (as each task finishes)
//!   ├─► join all handles in submission order       (barrier)
//!   │      ├─ Ok(v)        → results[i] = v
//!   │      ├─ Err(e)       → results[i] = T::default()
//!   │      └─ panic        → results[i] = T::default() [+ Error event]
//!   └─► RunOutcome { results, error: AggregateError (submission order) }
//! ```
//!
//! ## Rules
//! - A failing task never cancels or affects its siblings (run to completion).
//! - No retry, no timeout, no concurrency bound: N tasks → N concurrent executions.
//! - `run_tasks` drains the pending set; resubmit failed work with `add_task`.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;

use crate::error::{AggregateError, TaskError, TaskFailure};
use crate::events::{Event, EventBus};
use crate::tasks::TaskRef;

use super::RunOutcome;

/// Collects tasks producing `T` and runs them in parallel.
pub struct ClusterManager<T: Default + Send + 'static> {
    pending: Mutex<Vec<TaskRef<T>>>,
    bus: Option<EventBus>,
}

impl<T: Default + Send + 'static> Default for ClusterManager<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            bus: None,
        }
    }
}

impl<T> ClusterManager<T>
where
    T: Default + Send + 'static,
{
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports each task's completion as a `Success` / `Error` event on `bus`, published
    /// from the task's own execution unit as soon as it finishes.
    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Appends a task to the pending set. Nothing runs until [`run_tasks`](Self::run_tasks).
    pub fn add_task(&self, task: TaskRef<T>) {
        self.pending.lock().push(task);
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Runs every pending task concurrently and waits for all of them.
    ///
    /// Returns as late as the slowest task. The result vector has one slot per task,
    /// index-aligned with submission order regardless of completion order.
    pub async fn run_tasks(&self) -> RunOutcome<T> {
        let tasks = std::mem::take(&mut *self.pending.lock());
        if tasks.is_empty() {
            return RunOutcome {
                results: Vec::new(),
                error: None,
            };
        }
        tracing::debug!(tasks = tasks.len(), "cluster run starting");

        let handles: Vec<_> = tasks
            .iter()
            .map(|task| {
                let task = Arc::clone(task);
                let bus = self.bus.clone();
                tokio::spawn(async move {
                    let res = task.execute().await;
                    if let Some(bus) = &bus {
                        bus.emit(completion_event(task.name(), &res));
                    }
                    res
                })
            })
            .collect();
        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(joined.len());
        let mut failures = Vec::new();
        for (index, (task, res)) in tasks.iter().zip(joined).enumerate() {
            let name = task.name();
            let res = match res {
                Ok(res) => res,
                Err(join_err) => {
                    let err = TaskError::fail(if join_err.is_panic() {
                        format!("task '{name}' panicked")
                    } else {
                        format!("task '{name}' was aborted")
                    });
                    // The execution unit died before it could report.
                    if let Some(bus) = &self.bus {
                        bus.emit(failure_event(name, &err));
                    }
                    Err(err)
                }
            };

            match res {
                Ok(value) => results.push(value),
                Err(err) => {
                    tracing::warn!(task = name, index, error = %err, label = err.as_label(), "task failed");
                    failures.push(TaskFailure {
                        index,
                        task: name.to_string(),
                        message: err.to_string(),
                    });
                    results.push(T::default());
                }
            }
        }

        let error = AggregateError::from_failures(failures);
        tracing::debug!(
            tasks = results.len(),
            failed = error.as_ref().map_or(0, |e| e.failures().len()),
            "cluster run finished"
        );
        RunOutcome { results, error }
    }
}

/// Terminal event of one task.
fn completion_event<T>(name: &str, res: &Result<T, TaskError>) -> Event {
    match res {
        Ok(_) => Event::success(format!("task '{name}' succeeded")).with_task(name),
        Err(err) => failure_event(name, err),
    }
}

fn failure_event(name: &str, err: &TaskError) -> Event {
    let mut ev = Event::error(err.to_string()).with_task(name);
    if let TaskError::Process(p) = err {
        if let Some(out) = p.output() {
            ev = ev.with_diagnostic(out);
        }
    }
    ev
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::tasks::TaskFn;
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc};

    fn delayed(name: &'static str, delay_ms: u64, value: u32) -> TaskRef<u32> {
        TaskFn::arc(name, move || async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, TaskError>(value)
        })
    }

    fn failing(name: &'static str, msg: &'static str) -> TaskRef<u32> {
        TaskFn::arc(name, move || async move { Err::<u32, _>(TaskError::fail(msg)) })
    }

    #[tokio::test]
    async fn zero_tasks_yield_empty_success() {
        let cm = ClusterManager::<u32>::new();
        let out = cm.run_tasks().await;
        assert!(out.results.is_empty());
        assert!(out.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn results_follow_submission_order_not_completion_order() {
        let cm = ClusterManager::new();
        cm.add_task(delayed("slow", 120, 1));
        cm.add_task(delayed("medium", 60, 2));
        cm.add_task(delayed("fast", 0, 3));

        let out = cm.run_tasks().await;
        assert_eq!(out.results, vec![1, 2, 3]);
        assert!(out.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_slot_holds_default_and_error_is_aggregated() {
        let cm = ClusterManager::new();
        cm.add_task(delayed("r0", 10, 7));
        cm.add_task(failing("disk", "disk full"));
        cm.add_task(delayed("r2", 0, 9));

        let out = cm.run_tasks().await;
        assert_eq!(out.results, vec![7, 0, 9]);
        let err = out.error.expect("aggregate error");
        assert_eq!(err.joined(), "disk full; ");
        assert!(err.to_string().contains("disk full; "));
        assert_eq!(err.failures()[0].index, 1);
        assert_eq!(err.failures()[0].task, "disk");
    }

    #[tokio::test]
    async fn several_failures_keep_submission_order() {
        let cm = ClusterManager::new();
        cm.add_task(failing("a", "first"));
        cm.add_task(delayed("ok", 0, 1));
        cm.add_task(failing("b", "second"));

        let err = cm.run_tasks().await.into_result().unwrap_err();
        assert_eq!(err.to_string(), "errors occurred: first; second; ");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_cancel_siblings() {
        let cm = ClusterManager::new();
        cm.add_task(failing("early", "early failure"));
        cm.add_task(delayed("late", 80, 42));

        let out = cm.run_tasks().await;
        assert_eq!(out.results, vec![0, 42]);
    }

    #[tokio::test]
    async fn panicking_task_counts_as_failure() {
        let cm = ClusterManager::new();
        cm.add_task(TaskFn::arc("explode", || async {
            if true {
                panic!("kaboom");
            }
            Ok::<u32, TaskError>(0)
        }));
        cm.add_task(delayed("fine", 0, 5));

        let out = cm.run_tasks().await;
        assert_eq!(out.results, vec![0, 5]);
        assert_eq!(out.error.unwrap().joined(), "task 'explode' panicked; ");
    }

    #[tokio::test]
    async fn run_drains_pending_set() {
        let cm = ClusterManager::new();
        cm.add_task(delayed("once", 0, 1));
        assert_eq!(cm.len(), 1);

        assert_eq!(cm.run_tasks().await.results, vec![1]);
        assert!(cm.is_empty());
        assert!(cm.run_tasks().await.results.is_empty());
    }

    #[tokio::test]
    async fn attached_bus_reports_each_task() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe_fn("recorder", move |ev| {
            let _ = tx.send((ev.kind, ev.task.as_deref().map(str::to_string)));
        });

        let cm = ClusterManager::new().with_bus(bus.clone());
        cm.add_task(delayed("good", 0, 1));
        cm.add_task(failing("bad", "nope"));
        cm.run_tasks().await;
        bus.close().await;

        let mut seen = Vec::new();
        while let Ok(item) = rx.try_recv() {
            seen.push(item);
        }
        // Completion order, not submission order.
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&(EventKind::Success, Some("good".to_string()))));
        assert!(seen.contains(&(EventKind::Error, Some("bad".to_string()))));
    }

    #[tokio::test]
    async fn finished_task_is_reported_while_siblings_still_run() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe_fn("recorder", move |ev| {
            let _ = tx.send((ev.kind, ev.task.as_deref().map(str::to_string)));
        });

        let gate = Arc::new(Notify::new());
        let cm = Arc::new(ClusterManager::new().with_bus(bus.clone()));
        cm.add_task(TaskFn::arc("slow", {
            let gate = Arc::clone(&gate);
            move || {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok::<_, TaskError>(1u32)
                }
            }
        }));
        cm.add_task(delayed("fast", 0, 2));

        let run = tokio::spawn({
            let cm = Arc::clone(&cm);
            async move { cm.run_tasks().await }
        });

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("fast task reported before the barrier");
        assert_eq!(first, Some((EventKind::Success, Some("fast".to_string()))));
        assert!(!run.is_finished());

        gate.notify_one();
        assert_eq!(run.await.unwrap().results, vec![1, 2]);
        bus.close().await;
        assert_eq!(
            rx.recv().await,
            Some((EventKind::Success, Some("slow".to_string())))
        );
    }
}
