//! wg Task Pool
//!
//! `WgTaskPool` is a `gst::TaskPool` that starts one OS thread per pushed
//! function through a [`wg::TaskPool`]. GStreamer uses it for the streaming
//! tasks of elements once it is installed on their bus (see
//! [`crate::bus::install_task_pool`]).
//!
//! ## Behaviour
//! - `prepare` and `cleanup` do nothing
//! - `push` starts a named thread per function, with no queue and no reuse
//! - `join` blocks until that thread has finished
//! - A thread that cannot be started is reported as a `gst::CoreError::Thread`
//!   error; nothing is retried

// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::subclass::prelude::*;
use gstreamer as gst;

use wg::config::TaskPoolConfig;

/// Core implementation (GObject subclass, TaskPoolImpl)
mod imp;

/// GLib wrapper type for the wg task pool.
///
/// ## Inheritance Chain (GStreamer class hierarchy)
/// - `gst::Object` (base GStreamer object)
/// - `gst::TaskPool` (thread provider for `gst::Task`)
/// - `WgTaskPool` (our implementation)
glib::wrapper! {
    pub struct WgTaskPool(ObjectSubclass<imp::WgTaskPool>) @extends gst::TaskPool, gst::Object;
}

impl WgTaskPool {
    /// Creates a pool whose threads follow `config`.
    pub fn new(config: TaskPoolConfig) -> Self {
        let pool: Self = glib::Object::new();
        pool.imp().configure(config);
        pool
    }

    /// Number of pushed functions not yet joined.
    pub fn outstanding(&self) -> usize {
        self.imp().outstanding()
    }
}

impl Default for WgTaskPool {
    fn default() -> Self {
        Self::new(TaskPoolConfig::default())
    }
}
