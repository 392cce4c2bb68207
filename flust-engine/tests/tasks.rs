mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use flust_engine::builder::FlutterEngineBuilder;
use flust_engine::ffi::FlutterTask;
use flust_engine::{CreateError, RunError};

use common::{engine, pump_until, CountingWaker, RecordingBinding};

#[test]
fn past_task_runs_on_next_pass() {
    let (engine, binding) = engine();
    binding.now.store(1_000, Ordering::SeqCst);

    binding.callbacks().post_task(FlutterTask::new(1, 7), 500);
    assert!(binding.tasks.lock().is_empty());

    let next = engine.execute_platform_tasks();
    assert_eq!(*binding.tasks.lock(), vec![FlutterTask::new(1, 7)]);
    assert_eq!(next, None);
}

#[test]
fn future_task_bounds_the_wait() {
    let (engine, binding) = engine();
    binding.now.store(0, Ordering::SeqCst);

    let before = Instant::now();
    binding
        .callbacks()
        .post_task(FlutterTask::new(1, 8), Duration::from_millis(10).as_nanos() as u64);

    let next = engine.execute_platform_tasks().unwrap();
    assert!(binding.tasks.lock().is_empty());
    assert!(next >= before + Duration::from_millis(10));
    assert!(next <= Instant::now() + Duration::from_millis(10));

    assert!(pump_until(&engine, || !binding.tasks.lock().is_empty()));
    assert!(Instant::now() >= before + Duration::from_millis(10));
}

#[test]
fn posting_wakes_the_platform_thread() {
    let binding = Arc::new(RecordingBinding::default());
    let waker = Arc::new(CountingWaker::default());
    let engine = FlutterEngineBuilder::new()
        .with_binding(binding.clone())
        .with_platform_handler(waker.clone())
        .build()
        .unwrap();
    engine.run().unwrap();

    binding.callbacks().post_task(FlutterTask::new(0, 1), 0);
    assert_eq!(waker.0.load(Ordering::SeqCst), 1);

    let remote = engine.clone();
    thread::spawn(move || remote.run_on_platform_thread(|_| {}))
        .join()
        .unwrap();
    assert_eq!(waker.0.load(Ordering::SeqCst), 2);
}

#[test]
fn engine_runner_is_bound_to_creating_thread() {
    let (engine, binding) = engine();
    assert!(engine.is_platform_thread());
    assert!(binding.callbacks().runs_task_on_current_thread());

    let callbacks = binding.callbacks();
    let remote = engine.clone();
    let (on_platform, runs_here) = thread::spawn(move || {
        (
            remote.is_platform_thread(),
            callbacks.runs_task_on_current_thread(),
        )
    })
    .join()
    .unwrap();
    assert!(!on_platform);
    assert!(!runs_here);
}

#[test]
fn blocking_rendezvous_returns_result() {
    let (engine, _binding) = engine();
    assert_eq!(engine.run_on_platform_thread_blocking(|_| 1 + 1), Some(2));

    let remote = engine.clone();
    let worker = thread::spawn(move || {
        remote.run_on_platform_thread_blocking(|engine| engine.is_platform_thread())
    });
    assert!(pump_until(&engine, || worker.is_finished()));
    assert_eq!(worker.join().unwrap(), Some(true));
}

#[test]
fn tasker_jobs_run_off_platform_thread() {
    let (engine, _binding) = engine();
    let (tx, rx) = crossbeam_channel::bounded(1);
    let remote = engine.clone();
    engine.run_on_tasker(move || {
        tx.send(remote.is_platform_thread()).unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(false));
}

#[test]
fn builder_requires_binding_and_handler() {
    let missing_binding = FlutterEngineBuilder::new()
        .with_platform_handler(Arc::new(CountingWaker::default()))
        .build();
    assert!(matches!(missing_binding, Err(CreateError::NoBinding)));

    let missing_handler = FlutterEngineBuilder::new()
        .with_binding(Arc::new(RecordingBinding::default()))
        .build();
    assert!(matches!(missing_handler, Err(CreateError::NoHandler)));
}

#[test]
fn run_is_refused_off_platform_thread() {
    let (engine, _binding) = engine();
    let remote = engine.clone();
    let result = thread::spawn(move || remote.run()).join().unwrap();
    assert!(matches!(result, Err(RunError::NotPlatformThread)));
}

#[test]
fn shutdown_reaches_binding() {
    let (engine, binding) = engine();
    assert!(binding.running.load(Ordering::SeqCst));
    engine.shutdown();
    assert!(!binding.running.load(Ordering::SeqCst));
}
