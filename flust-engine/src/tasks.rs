use std::cmp::Reverse;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use priority_queue::PriorityQueue;
use tracing::{error, trace};

use crate::ffi::FlutterTask;

pub trait TaskRunnerHandler {
    /// Wakes up the platform thread's event loop, which may be blocked
    /// waiting for events.
    fn wake(&self);
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Task {
    seq: u64,
    task: FlutterTask,
}

pub(crate) struct TaskRunnerInner {
    next_seq: u64,
    // Ties on the deadline are broken by insertion order.
    tasks: PriorityQueue<Task, Reverse<(Instant, u64)>>,
}

/// Engine tasks waiting for their deadline on the platform thread.
///
/// Tasks cannot be cancelled. Once popped they always run.
#[derive(Clone)]
pub struct TaskRunner {
    thread_id: ThreadId,
    pub(crate) inner: Arc<Mutex<TaskRunnerInner>>,
    handler: Arc<dyn TaskRunnerHandler + Send + Sync>,
}

impl TaskRunner {
    /// Creates a runner bound to the calling thread.
    pub fn new(handler: Arc<dyn TaskRunnerHandler + Send + Sync>) -> Self {
        Self {
            thread_id: thread::current().id(),
            inner: Arc::new(Mutex::new(TaskRunnerInner {
                next_seq: 0,
                tasks: PriorityQueue::new(),
            })),
            handler,
        }
    }

    pub fn runs_task_on_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queues `task` for `target_time_nanos` on the engine clock, whose
    /// current reading is `engine_now_nanos`.
    pub fn post_task(&self, task: FlutterTask, target_time_nanos: u64, engine_now_nanos: u64) {
        let delay = Duration::from_nanos(target_time_nanos.saturating_sub(engine_now_nanos));
        self.post_task_at(task, Instant::now() + delay);
    }

    pub fn post_task_at(&self, task: FlutterTask, deadline: Instant) {
        trace!("post_task {:?}", task);
        {
            let mut inner = self.inner.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.tasks.push(Task { seq, task }, Reverse((deadline, seq)));
        }
        self.handler.wake();
    }

    /// Runs every task whose deadline has passed and returns the deadline of
    /// the earliest task still pending.
    ///
    /// The queue lock is not held while `run` executes, so running tasks may
    /// post new ones.
    pub fn execute_tasks<F>(&self, mut run: F) -> Option<Instant>
    where
        F: FnMut(&FlutterTask),
    {
        let now = Instant::now();
        let mut due = Vec::new();
        {
            let mut inner = self.inner.lock();
            loop {
                match inner.tasks.peek() {
                    Some((_, Reverse((deadline, _)))) if *deadline <= now => {}
                    _ => break,
                }
                if let Some((task, _)) = inner.tasks.pop() {
                    due.push(task.task);
                }
            }
        }

        for task in &due {
            trace!("run_task {:?}", task);
            run(task);
        }

        self.next_deadline()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner
            .lock()
            .tasks
            .peek()
            .map(|(_, Reverse((deadline, _)))| *deadline)
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    pub fn wake(&self) {
        self.handler.wake();
    }
}

type Job = Box<dyn FnOnce() + Send>;

/// Auxiliary worker thread for handlers that must not block the platform
/// thread. Jobs run one at a time in submission order.
pub struct Tasker {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Tasker {
    pub fn new() -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let worker = thread::Builder::new()
            .name("flust-tasker".to_owned())
            .spawn(move || {
                for job in receiver {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("Tasker job panicked");
                    }
                }
                trace!("tasker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Box::new(job)).is_err() {
            error!("Tasker is not running, dropping job");
        }
    }
}

impl Drop for Tasker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            // The last engine reference may be released by a job on the worker itself.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                error!("Tasker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler(AtomicUsize);

    impl TaskRunnerHandler for CountingHandler {
        fn wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn runner() -> (TaskRunner, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        (TaskRunner::new(handler.clone()), handler)
    }

    #[test]
    fn past_deadline_runs_on_next_execute() {
        let (runner, handler) = runner();
        runner.post_task(FlutterTask::new(1, 1), 100, 500);
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);

        let mut ran = Vec::new();
        let next = runner.execute_tasks(|task| ran.push(*task));
        assert_eq!(ran, vec![FlutterTask::new(1, 1)]);
        assert_eq!(next, None);
        assert_eq!(runner.pending_tasks(), 0);
    }

    #[test]
    fn future_deadline_is_reported_not_run() {
        let (runner, _) = runner();
        let before = Instant::now();
        runner.post_task(FlutterTask::new(1, 2), 1_000_000_000, 0);

        let mut ran = 0;
        let next = runner.execute_tasks(|_| ran += 1).unwrap();
        assert_eq!(ran, 0);
        assert!(next >= before + Duration::from_secs(1));
        assert!(next <= Instant::now() + Duration::from_secs(1));
    }

    #[test]
    fn due_tasks_run_in_deadline_order() {
        let (runner, _) = runner();
        let now = Instant::now();
        runner.post_task_at(FlutterTask::new(0, 3), now - Duration::from_millis(1));
        runner.post_task_at(FlutterTask::new(0, 1), now - Duration::from_millis(3));
        runner.post_task_at(FlutterTask::new(0, 2), now - Duration::from_millis(2));
        runner.post_task_at(FlutterTask::new(0, 4), now - Duration::from_millis(1));

        let mut ran = Vec::new();
        runner.execute_tasks(|task| ran.push(task.task));
        assert_eq!(ran, vec![1, 2, 3, 4]);
    }

    #[test]
    fn tasks_may_post_tasks_while_running() {
        let (runner, _) = runner();
        runner.post_task_at(FlutterTask::new(0, 1), Instant::now());

        let poster = runner.clone();
        let next = runner.execute_tasks(|task| {
            poster.post_task_at(
                FlutterTask::new(0, task.task + 1),
                Instant::now() + Duration::from_secs(60),
            );
        });
        assert!(next.is_some());
        assert_eq!(runner.pending_tasks(), 1);
    }

    #[test]
    fn runner_is_bound_to_creating_thread() {
        let (runner, _) = runner();
        assert!(runner.runs_task_on_current_thread());
        let other = runner.clone();
        let on_other = thread::spawn(move || other.runs_task_on_current_thread())
            .join()
            .unwrap();
        assert!(!on_other);
    }

    #[test]
    fn tasker_runs_jobs_in_order_and_survives_panics() {
        let tasker = Tasker::new().unwrap();
        let (tx, rx) = unbounded();

        let first = tx.clone();
        tasker.spawn(move || first.send(1).unwrap());
        tasker.spawn(|| panic!("boom"));
        tasker.spawn(move || tx.send(2).unwrap());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    }
}
