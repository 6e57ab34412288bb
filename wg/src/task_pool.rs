// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Thread-per-task pool.
//!
//! Implements the four calls of a framework task-execution interface:
//! [`TaskPool::prepare`] and [`TaskPool::cleanup`] do nothing,
//! [`TaskPool::push`] starts a new OS thread for each task and
//! [`TaskPool::join`] waits for it. There is no queue and no thread reuse.
//! Admission control is left to the framework pushing the tasks unless
//! [`TaskPoolConfig::max_threads`] is set.
//!
//! ```
//! use wg::TaskPool;
//!
//! let pool = TaskPool::default();
//! let handle = pool.push(|| println!("running on a fresh thread")).unwrap();
//! pool.join(handle);
//! assert_eq!(pool.outstanding(), 0);
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};

use crate::config::TaskPoolConfig;
use crate::error::ThreadError;

/// Unit of work run by the pool.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Starts OS threads on behalf of a [`TaskPool`].
pub trait Spawner: Send + Sync {
    fn spawn(&self, config: &TaskPoolConfig, task: Task) -> io::Result<JoinHandle<()>>;
}

/// Spawns threads with [`std::thread::Builder`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, config: &TaskPoolConfig, task: Task) -> io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder.spawn(task)
    }
}

/// Identifier record for one pushed task.
///
/// Pass it back to [`TaskPool::join`] exactly once. Dropping it without
/// joining detaches the thread and releases the record; the thread still
/// counts against [`TaskPoolConfig::max_threads`] until it exits.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    thread: JoinHandle<()>,
    record: Record,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the task's thread terminates, then releases its record.
    pub fn join(self) {
        let TaskHandle { id, thread, record } = self;
        if thread.join().is_err() {
            warn!(task = id, "Task panicked");
        }
        trace!(task = id, "Joined task");
        drop(record);
    }
}

/// Counter slot; released when dropped.
#[derive(Debug)]
struct Record(Arc<AtomicUsize>);

impl Record {
    /// Takes a slot and returns it with the count including it.
    fn acquire(counter: &Arc<AtomicUsize>) -> (Self, usize) {
        let live = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (Record(counter.clone()), live)
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Pool starting one OS thread per task.
pub struct TaskPool {
    config: TaskPoolConfig,
    spawner: Arc<dyn Spawner>,
    outstanding: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(TaskPoolConfig::default())
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("config", &self.config)
            .field("outstanding", &self.outstanding())
            .field("running", &self.running())
            .finish()
    }
}

impl TaskPool {
    pub fn new(config: TaskPoolConfig) -> Self {
        Self::with_spawner(config, Arc::new(ThreadSpawner))
    }

    /// Creates a pool that starts its threads through `spawner`.
    pub fn with_spawner(config: TaskPoolConfig, spawner: Arc<dyn Spawner>) -> Self {
        TaskPool {
            config,
            spawner,
            outstanding: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &TaskPoolConfig {
        &self.config
    }

    pub fn prepare(&self) -> Result<(), ThreadError> {
        trace!(thread_name = %self.config.thread_name, "Preparing task pool");
        Ok(())
    }

    pub fn cleanup(&self) {
        trace!(thread_name = %self.config.thread_name, "Cleaning up task pool");
    }

    /// Runs `func` on a new OS thread.
    ///
    /// # Errors
    ///
    /// Returns a [`ThreadError`] with code `Again` when the thread cannot be
    /// started or the configured thread limit is reached. The identifier
    /// record is released before returning; nothing is retried.
    pub fn push<F>(&self, func: F) -> Result<TaskHandle, ThreadError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (running, live) = Record::acquire(&self.running);
        if let Some(max) = self.config.max_threads.filter(|max| live > *max) {
            warn!(max, "Task pool thread limit reached");
            return Err(ThreadError::again(format!("thread limit of {max} reached")));
        }
        let (record, _) = Record::acquire(&self.outstanding);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Freed when the thread exits, joined or not.
        let task: Task = Box::new(move || {
            let _running = running;
            func();
        });
        match self.spawner.spawn(&self.config, task) {
            Ok(thread) => {
                debug!(task = id, thread = ?thread.thread().id(), "Pushed task");
                Ok(TaskHandle { id, thread, record })
            }
            Err(err) => {
                error!(task = id, %err, "Error creating thread");
                Err(ThreadError::again(err.to_string()))
            }
        }
    }

    /// Waits for a task pushed to this pool. Equivalent to
    /// [`TaskHandle::join`].
    pub fn join(&self, handle: TaskHandle) {
        handle.join();
    }

    /// Number of identifier records not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Number of pushed tasks whose threads have not exited, joined or not.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}
