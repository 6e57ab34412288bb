//! wg Task Pool Implementation
//!
//! Forwards the four `GstTaskPool` virtual methods to a [`wg::TaskPool`]
//! and wraps its task handles so GStreamer can join them.

// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};

use gst::glib;
use gst::subclass::prelude::*;
use gstreamer as gst;
use tracing::trace;

use wg::config::TaskPoolConfig;
use wg::{ThreadError, ThreadErrorCode};

use crate::CAT;
use crate::taskpool;

/// Task pool implementation; the inner pool is replaced by `configure`.
#[derive(Default)]
pub struct WgTaskPool {
    pool: Mutex<Arc<wg::TaskPool>>,
}

impl WgTaskPool {
    pub(super) fn configure(&self, config: TaskPoolConfig) {
        match self.pool.lock() {
            Ok(mut pool) => *pool = Arc::new(wg::TaskPool::new(config)),
            Err(_) => gst::error!(CAT, imp = self, "Task pool mutex poisoned"),
        }
    }

    /// The current inner pool. Tasks already pushed keep the pool they were
    /// pushed to.
    fn pool(&self) -> Result<Arc<wg::TaskPool>, glib::Error> {
        self.pool.lock().map(|pool| pool.clone()).map_err(|_| {
            glib::Error::new(gst::CoreError::Failed, "Task pool mutex poisoned")
        })
    }

    pub(super) fn outstanding(&self) -> usize {
        self.pool().map(|pool| pool.outstanding()).unwrap_or(0)
    }
}

fn to_glib_error(err: ThreadError) -> glib::Error {
    match err.code {
        ThreadErrorCode::Again => glib::Error::new(gst::CoreError::Thread, &err.to_string()),
    }
}

/// Handle returned to GStreamer for each pushed function.
pub struct WgTaskHandle(wg::TaskHandle);

impl TaskHandle for WgTaskHandle {
    fn join(self) {
        trace!(task = self.0.id(), "GStreamer joining task");
        self.0.join();
    }
}

/// Registers this type as a GLib object subclass
#[glib::object_subclass]
impl ObjectSubclass for WgTaskPool {
    /// Internal type name (must be unique)
    const NAME: &'static str = "GstWgTaskPool";

    /// Public wrapper type
    type Type = taskpool::WgTaskPool;

    /// Parent class
    type ParentType = gst::TaskPool;
}

impl ObjectImpl for WgTaskPool {}

impl GstObjectImpl for WgTaskPool {}

impl TaskPoolImpl for WgTaskPool {
    type Handle = WgTaskHandle;

    fn prepare(&self) -> Result<(), glib::Error> {
        self.pool()?.prepare().map_err(to_glib_error)
    }

    fn cleanup(&self) {
        if let Ok(pool) = self.pool() {
            pool.cleanup();
        }
    }

    fn push(&self, func: gst::subclass::TaskPoolFunction) -> Result<Option<Self::Handle>, glib::Error> {
        let handle = self.pool()?.push(move || func.call()).map_err(|err| {
            gst::error!(CAT, imp = self, "{}", err);
            to_glib_error(err)
        })?;
        gst::trace!(CAT, imp = self, "Pushed task {}", handle.id());
        Ok(Some(WgTaskHandle(handle)))
    }
}
