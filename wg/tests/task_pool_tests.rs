// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Thread-per-task pool tests.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use wg::config::TaskPoolConfig;
use wg::{Spawner, Task, TaskPool, ThreadError, ThreadErrorCode};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

fn setup_test(config: TaskPoolConfig) -> TaskPool {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });
    TaskPool::new(config)
}

/// Refuses every thread, as an exhausted system would.
struct ExhaustedSpawner;

impl Spawner for ExhaustedSpawner {
    fn spawn(&self, _config: &TaskPoolConfig, _task: Task) -> io::Result<JoinHandle<()>> {
        Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "Resource temporarily unavailable",
        ))
    }
}

#[test]
fn each_task_runs_once_on_its_own_thread() {
    let pool = setup_test(TaskPoolConfig::default());
    let runs = Arc::new(AtomicUsize::new(0));
    let threads = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runs = runs.clone();
            let threads = threads.clone();
            pool.push(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                threads.lock().unwrap().insert(thread::current().id());
            })
            .unwrap()
        })
        .collect();

    let ids: HashSet<u64> = handles.iter().map(|h| h.id()).collect();
    assert_eq!(ids.len(), 8);
    assert_eq!(pool.outstanding(), 8);

    for handle in handles {
        pool.join(handle);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 8);
    assert_eq!(threads.lock().unwrap().len(), 8);
    assert!(!threads.lock().unwrap().contains(&thread::current().id()));
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn join_waits_for_completion() {
    let pool = setup_test(TaskPoolConfig::default());
    let (tx, rx) = std::sync::mpsc::channel();
    let done = Arc::new(AtomicUsize::new(0));
    let flag = done.clone();

    let handle = pool
        .push(move || {
            rx.recv().unwrap();
            flag.store(1, Ordering::SeqCst);
        })
        .unwrap();
    assert!(!handle.is_finished());
    tx.send(()).unwrap();
    pool.join(handle);
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn spawn_failure_reports_again_and_releases_record() {
    let pool = TaskPool::with_spawner(TaskPoolConfig::default(), Arc::new(ExhaustedSpawner));
    let ran = Arc::new(AtomicUsize::new(0));
    let flag = ran.clone();

    let err: ThreadError = pool
        .push(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap_err();

    assert_eq!(err.code, ThreadErrorCode::Again);
    assert_eq!(ThreadError::DOMAIN, "thread");
    assert!(err.to_string().starts_with("Error creating thread: "));
    assert!(err.message.contains("Resource temporarily unavailable"));
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn configured_stack_size_is_accepted() {
    let pool = setup_test(TaskPoolConfig {
        stack_size: Some(256 * 1024),
        ..Default::default()
    });
    let handle = pool.push(|| {}).unwrap();
    pool.join(handle);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn limit_frees_up_after_join() {
    let pool = setup_test(TaskPoolConfig {
        max_threads: Some(2),
        ..Default::default()
    });
    let first = pool.push(|| {}).unwrap();
    let second = pool.push(|| {}).unwrap();
    assert!(pool.push(|| {}).is_err());

    pool.join(first);
    let third = pool.push(|| {}).unwrap();
    pool.join(second);
    pool.join(third);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn detached_task_still_counts_against_limit() {
    let pool = setup_test(TaskPoolConfig {
        max_threads: Some(1),
        ..Default::default()
    });
    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let handle = pool
        .push(move || {
            let _ = rx.recv();
        })
        .unwrap();
    drop(handle);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.running(), 1);

    let err = pool.push(|| {}).unwrap_err();
    assert_eq!(err.code, ThreadErrorCode::Again);
    assert_eq!(pool.running(), 1);

    tx.send(()).unwrap();
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while pool.running() > 0 {
        assert!(std::time::Instant::now() < deadline, "detached task never exited");
        thread::sleep(std::time::Duration::from_millis(5));
    }
    let handle = pool.push(|| {}).unwrap();
    pool.join(handle);
    assert_eq!(pool.running(), 0);
}
